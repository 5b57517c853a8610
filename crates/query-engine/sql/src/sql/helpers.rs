use super::ast::*;

/// An empty `WHERE` clause.
pub fn empty_where() -> Where {
    Where(None)
}

/// An empty `ORDER BY` clause.
pub fn empty_order_by() -> OrderBy {
    OrderBy { elements: vec![] }
}

/// Empty `LIMIT` and `OFFSET` clauses.
pub fn empty_limit() -> Limit {
    Limit {
        limit: None,
        offset: None,
    }
}

/// `<table> AS <alias>`
pub fn make_from(table_name: &str, alias: TableAlias) -> From {
    From {
        table: TableName(table_name.to_string()),
        alias,
    }
}

/// Build a simple select with a select list and the rest are empty.
pub fn simple_select(select_list: Vec<(ColumnAlias, Expression)>, from: From) -> Select {
    Select {
        select_list: SelectList::SelectList(select_list),
        from,
        joins: vec![],
        where_: empty_where(),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Build a `SELECT COUNT(*)` select; the rest are empty.
pub fn count_select(from: From) -> Select {
    Select {
        select_list: SelectList::Count,
        from,
        joins: vec![],
        where_: empty_where(),
        order_by: empty_order_by(),
        limit: empty_limit(),
    }
}

/// Create a table alias.
pub fn make_table_alias(name: &str) -> TableAlias {
    TableAlias { name: name.into() }
}

/// The alias a column is selected as: `<COLUMN>_<table alias>`.
pub fn make_column_alias(column: &ColumnName, table: &TableAlias) -> ColumnAlias {
    let ColumnName(column) = column;
    ColumnAlias {
        name: format!("{column}_{}", table.name),
    }
}

/// Select a column of an aliased table under its column alias.
pub fn make_column(table: TableAlias, name: ColumnName) -> (ColumnAlias, Expression) {
    let alias = make_column_alias(&name, &table);
    (
        alias,
        Expression::ColumnReference(ColumnReference::TableColumn { table, name }),
    )
}

/// `<left> = <right>`
pub fn equals(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::Equals,
        right: Box::new(right),
    }
}

/// `1 = 0`, a predicate no row satisfies. Portable where boolean literals are not.
pub fn false_expr() -> Expression {
    equals(Expression::Integer(1), Expression::Integer(0))
}

/// `<left> AND <right>`
pub fn and(left: Expression, right: Expression) -> Expression {
    Expression::BinaryOperation {
        left: Box::new(left),
        operator: BinaryOperator::And,
        right: Box::new(right),
    }
}

/// Join expressions with `AND`, left to right. `None` when there are none.
pub fn conjunction(expressions: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    expressions.into_iter().reduce(and)
}
