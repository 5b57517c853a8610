//! Describe the SQL execution plan.

use query_engine_metadata::metadata::ScalarType;

use super::ast;
use super::dialect::Dialect;
use super::string::SQL;

#[derive(Debug, Clone, PartialEq)]
/// Definition of an execution plan to be run against the database.
pub struct ExecutionPlan<Query> {
    /// The fully-qualified name of the entity type the request targets.
    pub root_entity: String,
    pub query: Query,
}

/// A read returning entities, with what is needed to fold its rows back into entities.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadQuery {
    pub select: ast::Select,
    pub shape: ResultShape,
    pub paging: Paging,
}

/// A `SELECT COUNT(*)` read returning a single integer.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    pub select: ast::Select,
}

/// An insert, update or delete.
#[derive(Debug, Clone, PartialEq)]
pub struct MutationQuery {
    pub statement: ast::Statement,
    /// Whether zero affected rows means the addressed entity does not exist.
    pub expects_affected_rows: bool,
}

impl ReadQuery {
    pub fn query_sql(&self, dialect: &Dialect) -> SQL {
        select_to_sql(&self.select, dialect)
    }
}

impl CountQuery {
    pub fn query_sql(&self, dialect: &Dialect) -> SQL {
        select_to_sql(&self.select, dialect)
    }
}

impl MutationQuery {
    pub fn query_sql(&self, dialect: &Dialect) -> SQL {
        let mut sql = SQL::new(dialect);
        self.statement.to_sql(&mut sql);
        sql
    }
}

/// How the columns of one result row map onto entities: the target entity first,
/// then each expand path with one shape per navigation segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultShape {
    pub entity: EntityShape,
    pub expands: Vec<Vec<EntityShape>>,
}

/// The columns of one entity type within a result row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityShape {
    pub entity: String,
    /// Names of the key properties, in key order.
    pub keys: Vec<String>,
    pub properties: Vec<PropertyShape>,
}

impl EntityShape {
    pub fn property(&self, name: &str) -> Option<&PropertyShape> {
        self.properties.iter().find(|property| property.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyShape {
    pub name: String,
    pub r#type: ScalarType,
    /// `None` for transient properties, which have no column.
    pub column: Option<ast::ColumnAlias>,
}

/// The effective paging of a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    /// Whether the server page size capped the requested `top`.
    pub server_side: bool,
    pub page_size: u32,
    pub top: Option<u32>,
    /// The requested skip plus the skiptoken.
    pub skip: u32,
}

pub fn select_to_sql(select: &ast::Select, dialect: &Dialect) -> SQL {
    let mut sql = SQL::new(dialect);
    select.to_sql(&mut sql);
    sql
}

/// A simple execution plan with only a root entity and a query.
pub fn simple_exec_plan<Query>(root_entity: String, query: Query) -> ExecutionPlan<Query> {
    ExecutionPlan { root_entity, query }
}
