//! Handle filtering/where clauses translation.
//!
//! Expressions are compiled bottom-up into the SQL AST. Parentheses are only added
//! where the operator priorities require them: a binary child of a binary parent is
//! wrapped when its priority is strictly lower than the parent's.

use query_engine_metadata::metadata::ComparisonOperator;
use query_engine_sql::sql;
use query_engine_sql::sql::dialect::ScalarFunction;

use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State, TableNameAndReference};
use crate::translation::request::{BinaryOperator, Expression, Literal, UnaryOperator};

/// A resolved, persisted column.
struct Column {
    expression: sql::ast::Expression,
    entity: String,
    property: String,
    comparison_operators: std::collections::BTreeSet<ComparisonOperator>,
    sql_type: Option<String>,
}

/// Translate a filter expression over `root` to a SQL boolean expression.
pub fn translate_expression(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    expression: &Expression,
) -> Result<sql::ast::Expression, Error> {
    match expression {
        Expression::Literal { literal } => values::translate_literal(literal, None),
        Expression::Property { .. } | Expression::Member { .. } => {
            Ok(translate_column(env, state, root, expression)?.expression)
        }
        Expression::Binary {
            operator,
            left,
            right,
        } => translate_binary(env, state, root, *operator, left, right),
        Expression::Unary { operator, operand } => {
            let inner = translate_expression(env, state, root, operand)?;
            let inner = match **operand {
                Expression::Unary { .. } | Expression::Binary { .. } => {
                    sql::ast::Expression::Nested(Box::new(inner))
                }
                _ => inner,
            };
            Ok(sql::ast::Expression::UnaryOperation {
                operator: match operator {
                    UnaryOperator::Not => sql::ast::UnaryOperator::Not,
                    UnaryOperator::Minus => sql::ast::UnaryOperator::Minus,
                },
                expression: Box::new(inner),
            })
        }
        Expression::Method { method, arguments } => {
            translate_method(env, state, root, method, arguments)
        }
    }
}

fn translate_binary(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    operator: BinaryOperator,
    left: &Expression,
    right: &Expression,
) -> Result<sql::ast::Expression, Error> {
    let sql_operator = translate_binary_operator(operator)?;

    // `X eq null` and `null eq X` become `X IS NULL`
    if matches!(operator, BinaryOperator::Eq | BinaryOperator::Ne) {
        let checked = match (left, right) {
            (_, Expression::Literal { literal: Literal::Null }) => Some(left),
            (Expression::Literal { literal: Literal::Null }, _) => Some(right),
            _ => None,
        };
        if let Some(checked) = checked {
            let checked = wrap_operand(
                operator,
                checked,
                translate_expression(env, state, root, checked)?,
            );
            return Ok(sql::ast::Expression::BinaryOperation {
                left: Box::new(checked),
                operator: if operator == BinaryOperator::Eq {
                    sql::ast::BinaryOperator::Is
                } else {
                    sql::ast::BinaryOperator::IsNot
                },
                right: Box::new(sql::ast::Expression::Null),
            });
        }
    }

    if operator.is_arithmetic() {
        for operand in [left, right] {
            ensure_arithmetic(env, state, root, operand)?;
        }
    }

    // literals compared with a column are bound with the column's explicit SQL type
    let left_sql = translate_operand(env, state, root, left, right)?;
    let right_sql = translate_operand(env, state, root, right, left)?;
    let left_sql = wrap_operand(operator, left, left_sql);
    let right_sql = wrap_operand(operator, right, right_sql);

    if operator == BinaryOperator::Mod && !env.dialect().has_modulo_operator() {
        let function = env
            .dialect()
            .function_name(ScalarFunction::Mod)
            .ok_or_else(|| Error::UnsupportedByDialect {
                dialect: env.dialect().kind(),
                feature: "modulo".to_string(),
            })?;
        return Ok(sql::ast::Expression::FunctionCall {
            function: sql::ast::Function(function.to_string()),
            args: vec![left_sql, right_sql],
        });
    }

    Ok(sql::ast::Expression::BinaryOperation {
        left: Box::new(left_sql),
        operator: sql_operator,
        right: Box::new(right_sql),
    })
}

fn translate_binary_operator(operator: BinaryOperator) -> Result<sql::ast::BinaryOperator, Error> {
    Ok(match operator {
        BinaryOperator::And => sql::ast::BinaryOperator::And,
        BinaryOperator::Or => sql::ast::BinaryOperator::Or,
        BinaryOperator::Eq => sql::ast::BinaryOperator::Equals,
        BinaryOperator::Ne => sql::ast::BinaryOperator::NotEquals,
        BinaryOperator::Lt => sql::ast::BinaryOperator::LessThan,
        BinaryOperator::Le => sql::ast::BinaryOperator::LessThanOrEqualTo,
        BinaryOperator::Gt => sql::ast::BinaryOperator::GreaterThan,
        BinaryOperator::Ge => sql::ast::BinaryOperator::GreaterThanOrEqualTo,
        BinaryOperator::Add => sql::ast::BinaryOperator::Add,
        BinaryOperator::Sub => sql::ast::BinaryOperator::Subtract,
        BinaryOperator::Mul => sql::ast::BinaryOperator::Multiply,
        BinaryOperator::Div => sql::ast::BinaryOperator::Divide,
        BinaryOperator::Mod => sql::ast::BinaryOperator::Modulo,
        BinaryOperator::PropertyAccess => {
            return Err(Error::UnsupportedExpressionKind(
                "property access as a binary operator".to_string(),
            ))
        }
    })
}

/// Wrap a binary child in parentheses when it binds less tightly than its parent.
fn wrap_operand(
    parent: BinaryOperator,
    operand: &Expression,
    translated: sql::ast::Expression,
) -> sql::ast::Expression {
    match operand {
        Expression::Binary { operator, .. } if operator.priority() < parent.priority() => {
            sql::ast::Expression::Nested(Box::new(translated))
        }
        _ => translated,
    }
}

/// Translate one side of a binary expression. A literal borrows the explicit SQL type
/// of the column on the other side.
fn translate_operand(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    operand: &Expression,
    other: &Expression,
) -> Result<sql::ast::Expression, Error> {
    match (operand, other) {
        (Expression::Literal { literal }, Expression::Property { .. } | Expression::Member { .. }) => {
            let column = translate_column(env, state, root, other)?;
            values::translate_literal(literal, column.sql_type)
        }
        _ => translate_expression(env, state, root, operand),
    }
}

fn ensure_arithmetic(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    operand: &Expression,
) -> Result<(), Error> {
    if let Expression::Property { .. } | Expression::Member { .. } = operand {
        let column = translate_column(env, state, root, operand)?;
        if !column
            .comparison_operators
            .contains(&ComparisonOperator::Arithmetic)
        {
            return Err(Error::UnsupportedExpressionKind(format!(
                "arithmetic on '{}' of '{}'",
                column.property, column.entity
            )));
        }
    }
    Ok(())
}

/// Resolve a property or member expression to a persisted column, joining the
/// navigation path of a member first.
fn translate_column(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    expression: &Expression,
) -> Result<Column, Error> {
    let (table, property) = match expression {
        Expression::Property { name } => (root.clone(), name),
        Expression::Member { path, property } => (state.join_path(env, &root.name, path)?, property),
        _ => {
            return Err(Error::UnsupportedExpressionKind(
                "a non-property expression where a column is expected".to_string(),
            ))
        }
    };
    let info = env.resolve_column(&table.name, property)?;
    let column = info.column.ok_or_else(|| Error::TransientPropertyInFilter {
        entity: table.name.clone(),
        property: property.clone(),
    })?;
    Ok(Column {
        expression: helpers::table_column(&table, column),
        comparison_operators: info.property.r#type.comparison_operators(),
        sql_type: info.sql_type(),
        entity: table.name,
        property: property.clone(),
    })
}

fn translate_method(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    method: &str,
    arguments: &[Expression],
) -> Result<sql::ast::Expression, Error> {
    match method {
        "startswith" => {
            let (column, pattern) = like_arguments(env, state, root, method, arguments, false)?;
            Ok(like(column, values::like_pattern(format!("{pattern}%"), None)))
        }
        "endswith" => {
            let (column, pattern) = like_arguments(env, state, root, method, arguments, false)?;
            Ok(like(column, values::like_pattern(format!("%{pattern}"), None)))
        }
        "substringof" => {
            let (column, pattern) = like_arguments(env, state, root, method, arguments, true)?;
            Ok(like(column, values::like_pattern(format!("%{pattern}%"), None)))
        }
        "concat" => {
            expect_arity(method, arguments, 2)?;
            function_call(env, state, root, ScalarFunction::Concat, arguments)
        }
        "length" => {
            expect_arity(method, arguments, 1)?;
            function_call(env, state, root, ScalarFunction::Length, arguments)
        }
        "toupper" => {
            expect_arity(method, arguments, 1)?;
            function_call(env, state, root, ScalarFunction::Upper, arguments)
        }
        "tolower" => {
            expect_arity(method, arguments, 1)?;
            function_call(env, state, root, ScalarFunction::Lower, arguments)
        }
        other => Err(Error::UnsupportedExpressionKind(format!("method '{other}'"))),
    }
}

fn expect_arity(method: &str, arguments: &[Expression], expected: usize) -> Result<(), Error> {
    if arguments.len() == expected {
        Ok(())
    } else {
        Err(Error::InvalidMethodArity {
            method: method.to_string(),
            expected,
            found: arguments.len(),
        })
    }
}

fn like(column: sql::ast::Expression, pattern: sql::ast::Expression) -> sql::ast::Expression {
    sql::ast::Expression::Like {
        expression: Box::new(column),
        pattern: Box::new(pattern),
    }
}

/// The column and the string literal of a `LIKE`-style method. `startswith` and
/// `endswith` take the column first; `substringof` takes the literal first.
fn like_arguments(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    method: &str,
    arguments: &[Expression],
    literal_first: bool,
) -> Result<(sql::ast::Expression, String), Error> {
    expect_arity(method, arguments, 2)?;
    let (column, literal) = if literal_first {
        (&arguments[1], &arguments[0])
    } else {
        (&arguments[0], &arguments[1])
    };
    let ambiguous = || Error::AmbiguousMethodArgumentOrder {
        method: method.to_string(),
    };
    if !matches!(column, Expression::Property { .. } | Expression::Member { .. }) {
        return Err(ambiguous());
    }
    let pattern = match literal {
        Expression::Literal {
            literal: Literal::String(pattern),
        } => pattern.clone(),
        Expression::Property { .. } | Expression::Member { .. } => return Err(ambiguous()),
        _ => {
            return Err(Error::UnsupportedExpressionKind(format!(
                "'{method}' with a non-string pattern"
            )))
        }
    };
    let column = translate_column(env, state, root, column)?;
    if !column.comparison_operators.contains(&ComparisonOperator::Like) {
        return Err(Error::UnsupportedExpressionKind(format!(
            "'{method}' on the non-string property '{}' of '{}'",
            column.property, column.entity
        )));
    }
    Ok((column.expression, pattern))
}

fn function_call(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    function: ScalarFunction,
    arguments: &[Expression],
) -> Result<sql::ast::Expression, Error> {
    let name = env
        .dialect()
        .function_name(function)
        .ok_or_else(|| Error::UnsupportedByDialect {
            dialect: env.dialect().kind(),
            feature: format!("{function:?}"),
        })?;
    let args = arguments
        .iter()
        .map(|argument| translate_expression(env, state, root, argument))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(sql::ast::Expression::FunctionCall {
        function: sql::ast::Function(name.to_string()),
        args,
    })
}

/// `AND` two where-clause parts, parenthesizing an `OR` on either side.
pub fn and(left: sql::ast::Expression, right: sql::ast::Expression) -> sql::ast::Expression {
    sql::helpers::and(wrap_disjunction(left), wrap_disjunction(right))
}

fn wrap_disjunction(expression: sql::ast::Expression) -> sql::ast::Expression {
    match expression {
        sql::ast::Expression::BinaryOperation {
            operator: sql::ast::BinaryOperator::Or,
            ..
        } => sql::ast::Expression::Nested(Box::new(expression)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_sql::sql::dialect::{Dialect, DialectKind};
    use query_engine_sql::sql::string::SQL;

    const HEADER: &str = "com.sap.mpl.MessageProcessingLogHeader";

    fn property(name: &str) -> Expression {
        Expression::Property {
            name: name.to_string(),
        }
    }

    fn string(value: &str) -> Expression {
        Expression::Literal {
            literal: Literal::String(value.to_string()),
        }
    }

    fn binary(operator: BinaryOperator, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn not(operand: Expression) -> Expression {
        Expression::Unary {
            operator: UnaryOperator::Not,
            operand: Box::new(operand),
        }
    }

    fn method(name: &str, arguments: Vec<Expression>) -> Expression {
        Expression::Method {
            method: name.to_string(),
            arguments,
        }
    }

    fn compile_with(dialect: &Dialect, expression: &Expression) -> Result<SQL, Error> {
        let metadata = tests_common::metadata::sample_metadata();
        let env = Env::new(&metadata, dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);
        let translated = translate_expression(&env, &mut state, &root, expression)?;
        let mut sql = SQL::new(dialect);
        translated.to_sql(&mut sql);
        Ok(sql)
    }

    fn compile(expression: &Expression) -> Result<SQL, Error> {
        compile_with(&Dialect::default(), expression)
    }

    fn eq(name: &str, value: &str) -> Expression {
        binary(BinaryOperator::Eq, property(name), string(value))
    }

    #[test]
    fn and_binds_tighter_so_no_parentheses_are_needed() {
        // Status eq 'A' or (Sender eq 'B' and Receiver eq 'C') or Status eq 'D'
        let expression = binary(
            BinaryOperator::Or,
            binary(
                BinaryOperator::Or,
                eq("Status", "A"),
                binary(BinaryOperator::And, eq("Sender", "B"), eq("Receiver", "C")),
            ),
            eq("Status", "D"),
        );
        assert_eq!(
            compile(&expression).unwrap().sql,
            "T0.STATUS = ? OR T0.SENDER = ? AND T0.RECEIVER = ? OR T0.STATUS = ?"
        );
    }

    #[test]
    fn or_under_and_is_parenthesized() {
        let expression = binary(
            BinaryOperator::And,
            binary(BinaryOperator::Or, eq("Status", "A"), eq("Sender", "B")),
            binary(BinaryOperator::Or, eq("Receiver", "C"), eq("Status", "D")),
        );
        assert_eq!(
            compile(&expression).unwrap().sql,
            "(T0.STATUS = ? OR T0.SENDER = ?) AND (T0.RECEIVER = ? OR T0.STATUS = ?)"
        );
    }

    #[test]
    fn not_wraps_compound_operands() {
        // (not(Status eq 'A') or Sender eq 'B') and not(Receiver eq 'C') or Status eq 'D'
        let expression = binary(
            BinaryOperator::Or,
            binary(
                BinaryOperator::And,
                binary(BinaryOperator::Or, not(eq("Status", "A")), eq("Sender", "B")),
                not(eq("Receiver", "C")),
            ),
            eq("Status", "D"),
        );
        assert_eq!(
            compile(&expression).unwrap().sql,
            "(NOT(T0.STATUS = ?) OR T0.SENDER = ?) AND NOT(T0.RECEIVER = ?) OR T0.STATUS = ?"
        );
    }

    #[test]
    fn null_comparisons_bind_nothing() {
        let null = || Expression::Literal {
            literal: Literal::Null,
        };
        let is_null = compile(&binary(BinaryOperator::Eq, property("Status"), null())).unwrap();
        assert_eq!(is_null.sql, "T0.STATUS IS NULL");
        assert!(is_null.params.is_empty());

        let is_not_null = compile(&binary(BinaryOperator::Ne, null(), property("Status"))).unwrap();
        assert_eq!(is_not_null.sql, "T0.STATUS IS NOT NULL");
        assert!(is_not_null.params.is_empty());
    }

    #[test]
    fn params_follow_placeholder_order() {
        let expression = binary(
            BinaryOperator::And,
            binary(
                BinaryOperator::Eq,
                property("Size"),
                Expression::Literal {
                    literal: Literal::Int(10),
                },
            ),
            eq("Sender", "x"),
        );
        let sql = compile(&expression).unwrap();
        assert_eq!(sql.sql, "T0.SIZE = ? AND T0.SENDER = ?");
        let params: Vec<String> = sql.params.iter().map(ToString::to_string).collect();
        similar_asserts::assert_eq!(params, vec!["10 (Edm.Int32)", "'x' (Edm.String)"]);
    }

    #[test]
    fn comparisons_and_date_literals() {
        let expression = binary(
            BinaryOperator::And,
            binary(BinaryOperator::Ne, property("Status"), string("COMPLETED")),
            binary(
                BinaryOperator::Lt,
                property("LogEnd"),
                Expression::Literal {
                    literal: Literal::DateTime("2023-03-01T10:15:30.250".to_string()),
                },
            ),
        );
        let sql = compile(&expression).unwrap();
        assert_eq!(sql.sql, "T0.STATUS <> ? AND T0.LOGEND < ?");
        assert_eq!(
            sql.params[1].to_string(),
            "'2023-03-01T10:15:30Z' (Edm.DateTime, TIMESTAMP)"
        );
    }

    #[test]
    fn string_functions() {
        let expression = binary(
            BinaryOperator::And,
            binary(
                BinaryOperator::Eq,
                method("toupper", vec![property("Status")]),
                string("FAILED"),
            ),
            binary(
                BinaryOperator::Eq,
                method("tolower", vec![property("MessageGuid")]),
                string("abc"),
            ),
        );
        assert_eq!(
            compile(&expression).unwrap().sql,
            "UPPER(T0.STATUS) = ? AND LOWER(T0.MESSAGEGUID) = ?"
        );

        let concat = method("concat", vec![string("ID-"), property("MessageGuid")]);
        assert_eq!(compile(&concat).unwrap().sql, "CONCAT(?,T0.MESSAGEGUID)");

        let length = binary(
            BinaryOperator::Gt,
            method("length", vec![property("Sender")]),
            Expression::Literal {
                literal: Literal::Int(3),
            },
        );
        assert_eq!(compile(&length).unwrap().sql, "LENGTH(T0.SENDER) > ?");
        assert_eq!(
            compile_with(&Dialect::new(DialectKind::MsSql, false), &length)
                .unwrap()
                .sql,
            "LEN(T0.SENDER) > ?"
        );
    }

    #[test]
    fn like_methods_wrap_the_pattern() {
        let starts = compile(&method("startswith", vec![property("Sender"), string("SAP")])).unwrap();
        assert_eq!(starts.sql, "T0.SENDER LIKE ?");
        assert_eq!(starts.params[0].to_string(), "'SAP%' (Edm.String)");

        let ends = compile(&method("endswith", vec![property("Sender"), string("SAP")])).unwrap();
        assert_eq!(ends.params[0].to_string(), "'%SAP' (Edm.String)");

        let contains =
            compile(&method("substringof", vec![string("SAP"), property("Sender")])).unwrap();
        assert_eq!(contains.sql, "T0.SENDER LIKE ?");
        assert_eq!(contains.params[0].to_string(), "'%SAP%' (Edm.String)");
    }

    #[test]
    fn swapped_like_arguments_are_rejected() {
        assert_eq!(
            compile(&method("startswith", vec![string("SAP"), property("Sender")])).unwrap_err(),
            Error::AmbiguousMethodArgumentOrder {
                method: "startswith".to_string()
            }
        );
        assert_eq!(
            compile(&method("substringof", vec![property("Sender"), string("SAP")])).unwrap_err(),
            Error::AmbiguousMethodArgumentOrder {
                method: "substringof".to_string()
            }
        );
        assert!(matches!(
            compile(&method("startswith", vec![property("Sender")])),
            Err(Error::InvalidMethodArity { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn transient_and_unknown_properties_are_rejected() {
        assert_eq!(
            compile(&eq("Duration", "1")).unwrap_err(),
            Error::TransientPropertyInFilter {
                entity: HEADER.to_string(),
                property: "Duration".to_string()
            }
        );
        assert!(matches!(
            compile(&eq("Nope", "1")),
            Err(Error::UnmappedProperty { .. })
        ));
        assert!(matches!(
            compile(&method("substring", vec![property("Sender")])),
            Err(Error::UnsupportedExpressionKind(_))
        ));
    }

    #[test]
    fn arithmetic_respects_priorities_and_dialects() {
        let int = |value| Expression::Literal {
            literal: Literal::Int(value),
        };
        // (Size add 1) mul 2 gt 10
        let expression = binary(
            BinaryOperator::Gt,
            binary(
                BinaryOperator::Mul,
                binary(BinaryOperator::Add, property("Size"), int(1)),
                int(2),
            ),
            int(10),
        );
        assert_eq!(compile(&expression).unwrap().sql, "(T0.SIZE + ?) * ? > ?");

        let modulo = binary(
            BinaryOperator::Eq,
            binary(BinaryOperator::Mod, property("Size"), int(2)),
            int(0),
        );
        assert_eq!(compile(&modulo).unwrap().sql, "T0.SIZE % ? = ?");
        assert_eq!(
            compile_with(&Dialect::new(DialectKind::Derby, false), &modulo)
                .unwrap()
                .sql,
            "MOD(T0.SIZE,?) = ?"
        );

        assert!(matches!(
            compile(&binary(BinaryOperator::Add, property("Status"), int(1))),
            Err(Error::UnsupportedExpressionKind(_))
        ));
    }

    #[test]
    fn members_join_their_navigation_path() {
        let metadata = tests_common::metadata::sample_metadata();
        let dialect = Dialect::default();
        let env = Env::new(&metadata, &dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);
        let expression = binary(
            BinaryOperator::Eq,
            Expression::Member {
                path: vec!["Attachments".to_string()],
                property: "Name".to_string(),
            },
            string("payload.xml"),
        );
        let translated = translate_expression(&env, &mut state, &root, &expression).unwrap();
        let mut sql = SQL::default();
        translated.to_sql(&mut sql);
        assert_eq!(sql.sql, "T1.NAME = ?");
        assert_eq!(state.joins.edges().len(), 1);
    }

    #[test]
    fn where_parts_parenthesize_disjunctions() {
        let column = |name: &str| {
            sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::Column(
                sql::ast::ColumnName(name.to_string()),
            ))
        };
        let disjunction = sql::ast::Expression::BinaryOperation {
            left: Box::new(column("A")),
            operator: sql::ast::BinaryOperator::Or,
            right: Box::new(column("B")),
        };
        let mut sql = SQL::default();
        and(column("K"), disjunction).to_sql(&mut sql);
        assert_eq!(sql.sql, "K AND (A OR B)");
    }
}
