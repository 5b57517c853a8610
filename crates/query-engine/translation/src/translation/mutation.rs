//! Translate insert, update and delete requests. Mutations address a single table,
//! so their columns are not qualified by an alias.

use indexmap::IndexMap;

use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{ExecutionPlan, MutationQuery};

use super::error::Error;
use super::helpers::Env;
use super::query::{resolve_key, values};
use super::request::{DeleteRequest, InsertRequest, Literal, UpdateRequest};

/// `INSERT INTO <table> (<columns>) VALUES (<params>)` with one column per persisted
/// property given a value, in declaration order.
pub fn build_insert(
    env: &Env,
    request: &InsertRequest,
) -> Result<ExecutionPlan<MutationQuery>, Error> {
    let info = env.lookup_entity(&request.entity)?;
    let (columns, values) = persisted_values(env, &request.entity, &request.values, &[])?
        .into_iter()
        .unzip::<_, _, Vec<_>, Vec<_>>();
    if columns.is_empty() {
        return Err(Error::EmptyInsert(request.entity.clone()));
    }

    let statement = sql::ast::Statement::Insert(sql::ast::Insert {
        table: sql::ast::TableName(info.table_name.clone()),
        columns,
        values,
    });
    Ok(mutation_plan(&request.entity, statement, false))
}

/// `UPDATE <table> SET <column>=? ... WHERE <key column>=? AND ...`. Key properties are
/// never set; the values of every key property must be given.
pub fn build_update(
    env: &Env,
    request: &UpdateRequest,
) -> Result<ExecutionPlan<MutationQuery>, Error> {
    let info = env.lookup_entity(&request.entity)?;
    let where_ = key_predicates(env, &request.entity, &request.key)?;
    let set = persisted_values(env, &request.entity, &request.values, &info.keys)?;
    if set.is_empty() {
        return Err(Error::EmptyUpdate(request.entity.clone()));
    }

    let statement = sql::ast::Statement::Update(sql::ast::Update {
        table: sql::ast::TableName(info.table_name.clone()),
        set,
        where_,
    });
    Ok(mutation_plan(&request.entity, statement, true))
}

/// `DELETE FROM <table> WHERE <key column>=? AND ...`
pub fn build_delete(
    env: &Env,
    request: &DeleteRequest,
) -> Result<ExecutionPlan<MutationQuery>, Error> {
    let info = env.lookup_entity(&request.entity)?;
    let where_ = key_predicates(env, &request.entity, &request.key)?;

    let statement = sql::ast::Statement::Delete(sql::ast::Delete {
        table: sql::ast::TableName(info.table_name.clone()),
        where_,
    });
    Ok(mutation_plan(&request.entity, statement, true))
}

/// The statement reading the current value of a sequence, used to learn generated keys.
pub fn current_sequence_value(env: &Env, sequence: &str) -> Result<String, Error> {
    Ok(env.dialect().current_sequence_value(sequence)?)
}

/// The statement advancing a sequence, used to pick a key before inserting.
pub fn next_sequence_value(env: &Env, sequence: &str) -> Result<String, Error> {
    Ok(env.dialect().next_sequence_value(sequence)?)
}

/// The statement reading the identity generated by the last insert.
pub fn last_identity_value(env: &Env) -> Result<String, Error> {
    Ok(env.dialect().last_identity_value()?)
}

fn mutation_plan(
    entity: &str,
    statement: sql::ast::Statement,
    expects_affected_rows: bool,
) -> ExecutionPlan<MutationQuery> {
    tracing::info!("SQL AST: {:?}", statement);
    sql::execution_plan::simple_exec_plan(
        entity.to_string(),
        MutationQuery {
            statement,
            expects_affected_rows,
        },
    )
}

fn key_predicates(
    env: &Env,
    entity: &str,
    key: &[super::request::KeyValue],
) -> Result<sql::ast::KeyPredicates, Error> {
    let predicates = resolve_key(env, entity, key)?
        .into_iter()
        .map(|(column, value)| (sql::ast::ColumnName(column), value))
        .collect();
    Ok(sql::ast::KeyPredicates(predicates))
}

/// The columns and parameters of the given values, in property declaration order.
/// Only persisted properties that are also given a value take part; names the entity
/// does not bind and the properties in `skip` are left out.
fn persisted_values(
    env: &Env,
    entity: &str,
    given: &IndexMap<String, Literal>,
    skip: &[String],
) -> Result<Vec<(sql::ast::ColumnName, sql::ast::Expression)>, Error> {
    let info = env.lookup_entity(entity)?;
    for unknown in given
        .keys()
        .filter(|name| !info.properties.contains_key(name.as_str()))
    {
        tracing::debug!(entity, property = %unknown, "ignoring unbound value");
    }

    let mut pairs = vec![];
    for (name, property) in info.persisted_properties() {
        let (Some(column), Some(value)) = (&property.column, given.get(name)) else {
            continue;
        };
        if skip.contains(name) {
            continue;
        }
        pairs.push((
            sql::ast::ColumnName(column.clone()),
            values::translate_literal(value, property.sql_type.clone())?,
        ));
    }
    Ok(pairs)
}
