//! Translate an incoming `QueryRequest`.

pub mod aliases;
pub mod fields;
pub mod filtering;
pub mod joins;
pub mod sorting;
pub mod values;

use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{CountQuery, ExecutionPlan, ReadQuery};

use crate::translation::error::Error;
use crate::translation::helpers::{self, Env, State, TableNameAndReference};
use crate::translation::paging;
use crate::translation::request::{KeyValue, Literal, QueryRequest};

/// Translate a read to a SELECT with its result shape and paging.
pub fn build_select(
    env: &Env,
    request: &QueryRequest,
) -> Result<ExecutionPlan<ReadQuery>, Error> {
    let mut state = State::new(&request.entity);
    let root = state.reference(&request.entity);

    // aliases are granted in this order: filter members, expands, navigation source, order-by
    let where_ = translate_where(env, &mut state, &root, request)?;
    let (select_list, shape) =
        fields::translate_fields(env, &mut state, &root, &request.select, &request.expand)?;
    let where_ = and_where(where_, translate_source(env, &mut state, &root, request)?);
    let order_by = sorting::translate_order_by(
        env,
        &mut state,
        &root,
        &request.order_by,
        !request.expand.is_empty(),
    )?;

    let paging = if request.key.is_empty() {
        paging::calculate_paging(
            request.top,
            request.skip,
            request.skip_token.as_deref(),
            env.server_page_size(),
        )?
    } else {
        paging::unpaged()
    };

    let from = from_root(env, &root)?;
    let mut select = sql::helpers::simple_select(select_list, from);
    select.joins = state.joins.into_joins();
    select.where_ = sql::ast::Where(where_);
    select.order_by = order_by;
    select.limit = sql::ast::Limit {
        limit: paging.top,
        offset: Some(paging.skip),
    };

    // log and return
    tracing::info!("SQL AST: {:?}", select);
    Ok(sql::execution_plan::simple_exec_plan(
        request.entity.clone(),
        ReadQuery {
            select,
            shape,
            paging,
        },
    ))
}

/// Translate a read to a `SELECT COUNT(*)` with the same filters and joins, but without
/// ordering or paging.
pub fn build_select_count(
    env: &Env,
    request: &QueryRequest,
) -> Result<ExecutionPlan<CountQuery>, Error> {
    let mut state = State::new(&request.entity);
    let root = state.reference(&request.entity);

    let where_ = translate_where(env, &mut state, &root, request)?;
    let where_ = and_where(where_, translate_source(env, &mut state, &root, request)?);

    let mut select = sql::helpers::count_select(from_root(env, &root)?);
    select.joins = state.joins.into_joins();
    select.where_ = sql::ast::Where(where_);

    tracing::info!("SQL AST: {:?}", select);
    Ok(sql::execution_plan::simple_exec_plan(
        request.entity.clone(),
        CountQuery { select },
    ))
}

/// Restrict a read to the entities whose `property` is one of `keys`:
/// `T0.<column> IN (?,?,...)`. Used to fetch expanded entities for a known set of owners.
/// With no owners the read matches nothing.
pub fn filter_by_keys(
    env: &Env,
    plan: &mut ExecutionPlan<ReadQuery>,
    property: &str,
    keys: &[Literal],
) -> Result<(), Error> {
    let info = env.resolve_column(&plan.root_entity, property)?;
    let column = info.column.ok_or_else(|| Error::TransientPropertyInFilter {
        entity: plan.root_entity.clone(),
        property: property.to_string(),
    })?;
    let root = TableNameAndReference {
        name: plan.root_entity.clone(),
        reference: plan.query.select.from.alias.clone(),
    };
    let restriction = if keys.is_empty() {
        sql::helpers::false_expr()
    } else {
        let list = keys
            .iter()
            .map(|value| values::translate_literal(value, info.sql_type()))
            .collect::<Result<Vec<_>, Error>>()?;
        sql::ast::Expression::InList {
            expression: Box::new(helpers::table_column(&root, column)),
            list,
        }
    };
    let sql::ast::Where(current) =
        std::mem::replace(&mut plan.query.select.where_, sql::helpers::empty_where());
    plan.query.select.where_ = sql::ast::Where(and_where(current, Some(restriction)));
    Ok(())
}

fn from_root(env: &Env, root: &TableNameAndReference) -> Result<sql::ast::From, Error> {
    let info = env.lookup_entity(&root.name)?;
    Ok(sql::helpers::make_from(&info.table_name, root.reference.clone()))
}

/// The key predicates of the request, then its filter.
fn translate_where(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    request: &QueryRequest,
) -> Result<Option<sql::ast::Expression>, Error> {
    let keys = if request.key.is_empty() {
        None
    } else {
        Some(key_predicates(env, root, &request.key)?)
    };
    let filter = request
        .filter
        .as_ref()
        .map(|filter| filtering::translate_expression(env, state, root, filter))
        .transpose()?;
    Ok(and_where(keys, filter))
}

/// For `/A(1)/Bs`: join the source entity and restrict it to the addressed key.
fn translate_source(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    request: &QueryRequest,
) -> Result<Option<sql::ast::Expression>, Error> {
    let Some(source) = &request.source else {
        return Ok(None);
    };
    let navigation = env.lookup_navigation(&source.entity, &source.navigation)?;
    if navigation.target != root.name {
        return Err(Error::NavigationNotFound {
            entity: source.entity.clone(),
            navigation: source.navigation.clone(),
        });
    }
    let source_table = state.join(env, &root.name, &source.entity)?;
    Ok(Some(key_predicates(env, &source_table, &source.key)?))
}

/// `<alias>.<key column> = ?` for every key property, joined by AND.
pub fn key_predicates(
    env: &Env,
    table: &TableNameAndReference,
    key: &[KeyValue],
) -> Result<sql::ast::Expression, Error> {
    let predicates = resolve_key(env, &table.name, key)?
        .into_iter()
        .map(|(column, value)| {
            sql::helpers::equals(helpers::table_column(table, &column), value)
        });
    sql::helpers::conjunction(predicates).ok_or_else(|| Error::MissingKeyPredicate {
        entity: table.name.clone(),
        property: String::new(),
    })
}

/// Pair every key column of `entity` with the parameter for its value, in key order.
/// A value must be given for every key property.
pub fn resolve_key(
    env: &Env,
    entity: &str,
    key: &[KeyValue],
) -> Result<Vec<(String, sql::ast::Expression)>, Error> {
    env.key_properties(entity)?
        .into_iter()
        .map(|(name, column)| {
            let value = key
                .iter()
                .find(|value| value.property == name)
                .ok_or_else(|| Error::MissingKeyPredicate {
                    entity: entity.to_string(),
                    property: name.to_string(),
                })?;
            let parameter = values::translate_literal(&value.value, column.sql_type())?;
            Ok((column.column.unwrap_or_default().to_string(), parameter))
        })
        .collect()
}

fn and_where(
    left: Option<sql::ast::Expression>,
    right: Option<sql::ast::Expression>,
) -> Option<sql::ast::Expression> {
    match (left, right) {
        (None, None) => None,
        (Some(expression), None) | (None, Some(expression)) => Some(expression),
        (Some(left), Some(right)) => Some(filtering::and(left, right)),
    }
}
