//! Translate an incoming entity request to an ExecutionPlan (SQL) to be run against the database.

pub mod error;
pub mod helpers;
pub mod mutation;
pub mod paging;
pub mod query;
pub mod request;

use query_engine_sql::sql::dialect::Dialect;
use query_engine_sql::sql::execution_plan::{CountQuery, ExecutionPlan, MutationQuery, ReadQuery};
use query_engine_sql::sql::string::SQL;

/// The execution plan of any request.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Read(ExecutionPlan<ReadQuery>),
    Count(ExecutionPlan<CountQuery>),
    Mutation(ExecutionPlan<MutationQuery>),
}

impl Plan {
    pub fn query_sql(&self, dialect: &Dialect) -> SQL {
        match self {
            Plan::Read(plan) => plan.query.query_sql(dialect),
            Plan::Count(plan) => plan.query.query_sql(dialect),
            Plan::Mutation(plan) => plan.query.query_sql(dialect),
        }
    }
}

/// Translate any request.
pub fn translate(env: &helpers::Env, request: &request::Request) -> Result<Plan, error::Error> {
    match request {
        request::Request::Query(query) => query::build_select(env, query).map(Plan::Read),
        request::Request::Count(query) => query::build_select_count(env, query).map(Plan::Count),
        request::Request::Insert(insert) => mutation::build_insert(env, insert).map(Plan::Mutation),
        request::Request::Update(update) => mutation::build_update(env, update).map(Plan::Mutation),
        request::Request::Delete(delete) => mutation::build_delete(env, delete).map(Plan::Mutation),
    }
}
