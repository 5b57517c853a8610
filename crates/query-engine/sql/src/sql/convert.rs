//! Convert a SQL AST to a low-level SQL string.

use super::ast::*;
use super::string::SQL;

// Convert to SQL strings

impl Statement {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Statement::Select(select) => select.to_sql(sql),
            Statement::Insert(insert) => insert.to_sql(sql),
            Statement::Update(update) => update.to_sql(sql),
            Statement::Delete(delete) => delete.to_sql(sql),
        }
    }
}

impl SelectList {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            SelectList::SelectList(select_list) => {
                for (index, (col, expr)) in select_list.iter().enumerate() {
                    expr.to_sql(sql);
                    sql.append_syntax(" AS ");
                    col.to_sql(sql);
                    if index < (select_list.len() - 1) {
                        sql.append_syntax(", ");
                    }
                }
            }
            SelectList::Count => {
                sql.append_syntax("COUNT(*)");
            }
        }
    }
}

impl Select {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("SELECT ");

        self.select_list.to_sql(sql);

        sql.append_syntax(" ");

        self.from.to_sql(sql);

        for join in &self.joins {
            join.to_sql(sql);
        }

        self.where_.to_sql(sql);

        self.order_by.to_sql(sql);

        self.limit.to_sql(sql);
    }
}

impl From {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("FROM ");
        self.table.to_sql(sql);
        sql.append_syntax(" AS ");
        self.alias.to_sql(sql);
    }
}

impl Join {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            Join::LeftOuterJoin(join) => {
                sql.append_syntax(" LEFT JOIN ");
                join.table.to_sql(sql);
                sql.append_syntax(" AS ");
                join.alias.to_sql(sql);
                sql.append_syntax(" ON ");
                join.on.to_sql(sql);
            }
        }
    }
}

impl Where {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Where(expression) = self;
        if let Some(expression) = expression {
            sql.append_syntax(" WHERE ");
            expression.to_sql(sql);
        }
    }
}

impl Insert {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("INSERT INTO ");
        self.table.to_sql(sql);
        sql.append_syntax(" (");
        for (index, column) in self.columns.iter().enumerate() {
            column.to_sql(sql);
            if index < (self.columns.len() - 1) {
                sql.append_syntax(",");
            }
        }
        sql.append_syntax(") VALUES (");
        for (index, value) in self.values.iter().enumerate() {
            value.to_sql(sql);
            if index < (self.values.len() - 1) {
                sql.append_syntax(",");
            }
        }
        sql.append_syntax(")");
    }
}

impl Update {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("UPDATE ");
        self.table.to_sql(sql);
        sql.append_syntax(" SET ");
        for (index, (column, value)) in self.set.iter().enumerate() {
            column.to_sql(sql);
            sql.append_syntax("=");
            value.to_sql(sql);
            if index < (self.set.len() - 1) {
                sql.append_syntax(",");
            }
        }
        self.where_.to_sql(sql);
    }
}

impl Delete {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_syntax("DELETE FROM ");
        self.table.to_sql(sql);
        self.where_.to_sql(sql);
    }
}

impl KeyPredicates {
    pub fn to_sql(&self, sql: &mut SQL) {
        let KeyPredicates(predicates) = self;
        if predicates.is_empty() {
            return;
        }
        sql.append_syntax(" WHERE ");
        for (index, (column, value)) in predicates.iter().enumerate() {
            column.to_sql(sql);
            sql.append_syntax("=");
            value.to_sql(sql);
            if index < (predicates.len() - 1) {
                sql.append_syntax(" AND ");
            }
        }
    }
}

// scalars
impl Expression {
    pub fn to_sql(&self, sql: &mut SQL) {
        match &self {
            Expression::ColumnReference(column_reference) => column_reference.to_sql(sql),
            Expression::Param(param) => sql.append_param(param.clone()),
            Expression::Null => sql.append_syntax("NULL"),
            Expression::Integer(value) => sql.append_syntax(&value.to_string()),
            Expression::Nested(expression) => {
                sql.append_syntax("(");
                expression.to_sql(sql);
                sql.append_syntax(")");
            }
            Expression::BinaryOperation {
                left,
                operator,
                right,
            } => {
                left.to_sql(sql);
                operator.to_sql(sql);
                right.to_sql(sql);
            }
            Expression::UnaryOperation {
                operator,
                expression,
            } => {
                operator.to_sql(sql);
                // `NOT(a = b)` but `NOT a`
                if *operator == UnaryOperator::Not && !matches!(**expression, Expression::Nested(_))
                {
                    sql.append_syntax(" ");
                }
                expression.to_sql(sql);
            }
            Expression::Like {
                expression,
                pattern,
            } => {
                expression.to_sql(sql);
                sql.append_syntax(" LIKE ");
                pattern.to_sql(sql);
            }
            Expression::InList { expression, list } => {
                expression.to_sql(sql);
                sql.append_syntax(" IN (");
                for (index, item) in list.iter().enumerate() {
                    item.to_sql(sql);
                    if index < (list.len() - 1) {
                        sql.append_syntax(",");
                    }
                }
                sql.append_syntax(")");
            }
            Expression::FunctionCall { function, args } => {
                function.to_sql(sql);
                sql.append_syntax("(");
                for (index, arg) in args.iter().enumerate() {
                    arg.to_sql(sql);
                    if index < (args.len() - 1) {
                        sql.append_syntax(",");
                    }
                }
                sql.append_syntax(")");
            }
        }
    }
}

impl BinaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            BinaryOperator::And => sql.append_syntax(" AND "),
            BinaryOperator::Or => sql.append_syntax(" OR "),
            BinaryOperator::Equals => sql.append_syntax(" = "),
            BinaryOperator::NotEquals => sql.append_syntax(" <> "),
            BinaryOperator::Is => sql.append_syntax(" IS "),
            BinaryOperator::IsNot => sql.append_syntax(" IS NOT "),
            BinaryOperator::LessThan => sql.append_syntax(" < "),
            BinaryOperator::LessThanOrEqualTo => sql.append_syntax(" <= "),
            BinaryOperator::GreaterThan => sql.append_syntax(" > "),
            BinaryOperator::GreaterThanOrEqualTo => sql.append_syntax(" >= "),
            BinaryOperator::Add => sql.append_syntax(" + "),
            BinaryOperator::Subtract => sql.append_syntax(" - "),
            BinaryOperator::Multiply => sql.append_syntax(" * "),
            BinaryOperator::Divide => sql.append_syntax(" / "),
            BinaryOperator::Modulo => sql.append_syntax(" % "),
        }
    }
}

impl UnaryOperator {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            UnaryOperator::Not => sql.append_syntax("NOT"),
            UnaryOperator::Minus => sql.append_syntax("-"),
        }
    }
}

impl Function {
    pub fn to_sql(&self, sql: &mut SQL) {
        let Function(name) = self;
        sql.append_syntax(name);
    }
}

impl Limit {
    pub fn to_sql(&self, sql: &mut SQL) {
        let clause = sql.paging_style().clause(self.limit, self.offset);
        if !clause.is_empty() {
            sql.append_syntax(" ");
            sql.append_syntax(&clause);
        }
    }
}

impl OrderBy {
    pub fn to_sql(&self, sql: &mut SQL) {
        if !self.elements.is_empty() {
            sql.append_syntax(" ORDER BY ");
            for (index, order_by_item) in self.elements.iter().enumerate() {
                order_by_item.to_sql(sql);
                if index < (self.elements.len() - 1) {
                    sql.append_syntax(", ");
                }
            }
        }
    }
}

impl OrderByElement {
    pub fn to_sql(&self, sql: &mut SQL) {
        self.target.to_sql(sql);
        self.direction.to_sql(sql);
    }
}

impl OrderByDirection {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            OrderByDirection::Asc => sql.append_syntax(" ASC"),
            OrderByDirection::Desc => sql.append_syntax(" DESC"),
        }
    }
}

// names
impl TableName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let TableName(name) = self;
        sql.append_identifier(name);
    }
}

impl TableAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_identifier(&self.name);
    }
}

impl ColumnName {
    pub fn to_sql(&self, sql: &mut SQL) {
        let ColumnName(name) = self;
        sql.append_identifier(name);
    }
}

impl ColumnReference {
    pub fn to_sql(&self, sql: &mut SQL) {
        match self {
            ColumnReference::TableColumn { table, name } => {
                table.to_sql(sql);
                sql.append_syntax(".");
                name.to_sql(sql);
            }
            ColumnReference::Column(name) => name.to_sql(sql),
        }
    }
}

impl ColumnAlias {
    pub fn to_sql(&self, sql: &mut SQL) {
        sql.append_quoted(&self.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::{Dialect, DialectKind};
    use crate::sql::helpers;
    use crate::sql::string::{Param, Value};
    use query_engine_metadata::metadata::ScalarType;

    fn column(table: &str, name: &str) -> Expression {
        Expression::ColumnReference(ColumnReference::TableColumn {
            table: helpers::make_table_alias(table),
            name: ColumnName(name.to_string()),
        })
    }

    fn param(value: &str) -> Expression {
        Expression::Param(Param {
            value: Value::String(value.to_string()),
            r#type: ScalarType::String,
            sql_type: None,
        })
    }

    #[test]
    fn select_with_join_where_order_and_paging() {
        let mut select = helpers::simple_select(
            vec![helpers::make_column(
                helpers::make_table_alias("T0"),
                ColumnName("MESSAGEGUID".to_string()),
            )],
            helpers::make_from("MPLHEADER", helpers::make_table_alias("T0")),
        );
        select.joins.push(Join::LeftOuterJoin(LeftOuterJoin {
            table: TableName("MPLATTACHMENTS".to_string()),
            alias: helpers::make_table_alias("T1"),
            on: helpers::equals(column("T1", "HEADERID"), column("T0", "ID")),
        }));
        select.where_ = Where(Some(helpers::equals(column("T0", "STATUS"), param("FAILED"))));
        select.order_by = OrderBy {
            elements: vec![OrderByElement {
                target: column("T0", "MESSAGEGUID"),
                direction: OrderByDirection::Asc,
            }],
        };
        select.limit = Limit {
            limit: Some(10),
            offset: Some(20),
        };

        let mut sql = SQL::new(&Dialect::new(DialectKind::Postgres, false));
        select.to_sql(&mut sql);
        similar_asserts::assert_eq!(
            sql.sql,
            "SELECT T0.MESSAGEGUID AS \"MESSAGEGUID_T0\" FROM MPLHEADER AS T0 \
             LEFT JOIN MPLATTACHMENTS AS T1 ON T1.HEADERID = T0.ID \
             WHERE T0.STATUS = ? ORDER BY T0.MESSAGEGUID ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params.len(), 1);
    }

    #[test]
    fn unary_operators_only_touch_nested_operands() {
        let not_nested = Expression::UnaryOperation {
            operator: UnaryOperator::Not,
            expression: Box::new(Expression::Nested(Box::new(helpers::equals(
                column("T0", "STATUS"),
                param("x"),
            )))),
        };
        let minus = Expression::UnaryOperation {
            operator: UnaryOperator::Minus,
            expression: Box::new(column("T0", "AMOUNT")),
        };
        let mut sql = SQL::default();
        not_nested.to_sql(&mut sql);
        sql.append_syntax(" | ");
        minus.to_sql(&mut sql);
        assert_eq!(sql.sql, "NOT(T0.STATUS = ?) | -T0.AMOUNT");
    }

    #[test]
    fn mutations_use_compact_column_lists() {
        let id = |name: &str| ColumnName(name.to_string());
        let insert = Statement::Insert(Insert {
            table: TableName("ENTITY4_TABLE".to_string()),
            columns: vec![id("ID4_1"), id("ID4_2")],
            values: vec![param("a"), param("b")],
        });
        let delete = Statement::Delete(Delete {
            table: TableName("ENTITY4_TABLE".to_string()),
            where_: KeyPredicates(vec![(id("ID4_1"), param("a")), (id("ID4_2"), param("b"))]),
        });

        let mut sql = SQL::default();
        insert.to_sql(&mut sql);
        assert_eq!(sql.sql, "INSERT INTO ENTITY4_TABLE (ID4_1,ID4_2) VALUES (?,?)");

        let mut sql = SQL::new(&Dialect::new(DialectKind::H2, true));
        insert.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "INSERT INTO \"ENTITY4_TABLE\" (\"ID4_1\",\"ID4_2\") VALUES (?,?)"
        );

        let mut sql = SQL::default();
        delete.to_sql(&mut sql);
        assert_eq!(sql.sql, "DELETE FROM ENTITY4_TABLE WHERE ID4_1=? AND ID4_2=?");
    }

    #[test]
    fn count_and_derby_paging() {
        let mut select = helpers::count_select(helpers::make_from(
            "MPLHEADER",
            helpers::make_table_alias("T0"),
        ));
        let mut sql = SQL::default();
        select.to_sql(&mut sql);
        assert_eq!(sql.sql, "SELECT COUNT(*) FROM MPLHEADER AS T0");

        select.limit = Limit {
            limit: Some(5),
            offset: None,
        };
        let mut sql = SQL::new(&Dialect::new(DialectKind::Derby, false));
        select.to_sql(&mut sql);
        assert_eq!(
            sql.sql,
            "SELECT COUNT(*) FROM MPLHEADER AS T0 FETCH FIRST 5 ROWS ONLY"
        );
    }
}
