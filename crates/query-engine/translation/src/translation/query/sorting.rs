//! Translate the order-by of a request to a SQL ORDER BY clause.

use query_engine_sql::sql;

use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State, TableNameAndReference};
use crate::translation::request::{Expression, OrderByItem, OrderDirection};

/// Convert the order-by items of a request to a SQL ORDER BY clause, joining the
/// navigation paths of member targets. Without items, order by the key ascending.
/// With `key_tie_break`, key columns not ordered by already are appended so that
/// the rows of one entity stay adjacent.
pub fn translate_order_by(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    order_by: &[OrderByItem],
    key_tie_break: bool,
) -> Result<sql::ast::OrderBy, Error> {
    let mut elements = order_by
        .iter()
        .map(|item| {
            Ok(sql::ast::OrderByElement {
                target: translate_target(env, state, root, &item.expression)?,
                direction: match item.direction {
                    OrderDirection::Asc => sql::ast::OrderByDirection::Asc,
                    OrderDirection::Desc => sql::ast::OrderByDirection::Desc,
                },
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    if elements.is_empty() || key_tie_break {
        for column in env.key_columns(&root.name)? {
            let target = helpers::table_column(root, &column);
            if !elements.iter().any(|element| element.target == target) {
                elements.push(sql::ast::OrderByElement {
                    target,
                    direction: sql::ast::OrderByDirection::Asc,
                });
            }
        }
    }

    Ok(sql::ast::OrderBy { elements })
}

fn translate_target(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    expression: &Expression,
) -> Result<sql::ast::Expression, Error> {
    let (table, property) = match expression {
        Expression::Property { name } => (root.clone(), name),
        Expression::Member { path, property } => (state.join_path(env, &root.name, path)?, property),
        _ => {
            return Err(Error::UnsupportedExpressionKind(
                "ordering by a non-property expression".to_string(),
            ))
        }
    };
    let info = env.resolve_column(&table.name, property)?;
    let column = info.column.ok_or_else(|| Error::TransientPropertyInOrderBy {
        entity: table.name.clone(),
        property: property.clone(),
    })?;
    Ok(helpers::table_column(&table, column))
}
