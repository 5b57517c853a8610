//! Plan the joins between the entity types a query references.

use std::collections::BTreeSet;

use query_engine_sql::sql;

use super::aliases::AliasRegistry;
use crate::translation::error::Error;
use crate::translation::helpers::Env;

/// The joins that bring `to`'s table into the query from `from`.
/// A plain association is one `LEFT JOIN`; a many-to-many association goes
/// through its mapping table and is two.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinEdge {
    pub from: sql::ast::TableAlias,
    pub to: sql::ast::TableAlias,
    pub joins: Vec<sql::ast::Join>,
}

/// The joins of one query, in planning order. No two edges share a (from, to) pair
/// and a type is never joined to itself.
#[derive(Debug, Clone)]
pub struct JoinPlanner {
    edges: Vec<JoinEdge>,
    planned: BTreeSet<(String, String)>,
    /// Entity types whose table is already part of the query.
    in_query: BTreeSet<String>,
}

impl JoinPlanner {
    /// A planner for a query reading `root`, which is in the FROM clause.
    pub fn new(root: &str) -> JoinPlanner {
        JoinPlanner {
            edges: vec![],
            planned: BTreeSet::new(),
            in_query: BTreeSet::from([root.to_string()]),
        }
    }

    /// Plan the join from `from` to `to`. Returns the new edge, or `None` when no SQL
    /// is needed: a self-join, a pair already planned, or a table already in the query.
    pub fn join_for(
        &mut self,
        env: &Env,
        aliases: &mut AliasRegistry,
        from: &str,
        to: &str,
    ) -> Result<Option<&JoinEdge>, Error> {
        if from == to {
            return Ok(None);
        }
        let pair = (from.to_string(), to.to_string());
        if self.planned.contains(&pair) {
            tracing::debug!("Join from {} to {} is already planned", from, to);
            return Ok(None);
        }
        if self.in_query.contains(to) {
            tracing::debug!("{} is already part of the query", to);
            return Ok(None);
        }

        let edge = plan_edge(env, aliases, from, to)?;
        self.planned.insert(pair);
        self.in_query.insert(to.to_string());
        self.edges.push(edge);
        Ok(self.edges.last())
    }

    pub fn edges(&self) -> &[JoinEdge] {
        &self.edges
    }

    /// The planned joins, in planning order.
    pub fn into_joins(self) -> Vec<sql::ast::Join> {
        self.edges.into_iter().flat_map(|edge| edge.joins).collect()
    }
}

fn plan_edge(
    env: &Env,
    aliases: &mut AliasRegistry,
    from: &str,
    to: &str,
) -> Result<JoinEdge, Error> {
    let from_info = env.lookup_entity(from)?;
    let to_info = env.lookup_entity(to)?;
    let from_alias = aliases.alias_for(from);

    match (from_info.mapping_tables.get(to), to_info.mapping_tables.get(from)) {
        (None, None) => {
            let (from_columns, to_columns) = env.resolve_association(from, to)?;
            let to_alias = aliases.alias_for(to);
            let on = join_condition(&to_alias, &to_columns, &from_alias, &from_columns);
            Ok(JoinEdge {
                from: from_alias,
                joins: vec![left_join(&to_info.table_name, to_alias.clone(), on)],
                to: to_alias,
            })
        }
        (Some(from_mapping), Some(to_mapping)) => {
            if from_mapping.table_name != to_mapping.table_name
                || from_mapping.join_columns.len() != from_info.keys.len()
                || to_mapping.join_columns.len() != to_info.keys.len()
            {
                return Err(Error::MappingTableMismatch {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            let mapping_alias = aliases.mapping_table_alias_for(from, to);
            let to_alias = aliases.alias_for(to);
            let into_mapping = join_condition(
                &mapping_alias,
                &from_mapping.join_columns,
                &from_alias,
                &env.key_columns(from)?,
            );
            let into_target = join_condition(
                &to_alias,
                &env.key_columns(to)?,
                &mapping_alias,
                &to_mapping.join_columns,
            );
            Ok(JoinEdge {
                from: from_alias,
                joins: vec![
                    left_join(&from_mapping.table_name, mapping_alias, into_mapping),
                    left_join(&to_info.table_name, to_alias.clone(), into_target),
                ],
                to: to_alias,
            })
        }
        _ => Err(Error::MissingMappingTable {
            from: from.to_string(),
            to: to.to_string(),
        }),
    }
}

fn left_join(table: &str, alias: sql::ast::TableAlias, on: sql::ast::Expression) -> sql::ast::Join {
    sql::ast::Join::LeftOuterJoin(sql::ast::LeftOuterJoin {
        table: sql::ast::TableName(table.to_string()),
        alias,
        on,
    })
}

/// `<joined>.<c1> = <anchor>.<d1> AND ...`, pairing the columns positionally.
fn join_condition(
    joined: &sql::ast::TableAlias,
    joined_columns: &[String],
    anchor: &sql::ast::TableAlias,
    anchor_columns: &[String],
) -> sql::ast::Expression {
    let column = |table: &sql::ast::TableAlias, name: &String| {
        sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::TableColumn {
            table: table.clone(),
            name: sql::ast::ColumnName(name.clone()),
        })
    };
    sql::helpers::conjunction(
        joined_columns
            .iter()
            .zip(anchor_columns)
            .map(|(joined_column, anchor_column)| {
                sql::helpers::equals(column(joined, joined_column), column(anchor, anchor_column))
            }),
    )
    .unwrap_or(sql::ast::Expression::Null)
}
