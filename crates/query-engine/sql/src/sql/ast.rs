//! Type definitions of a SQL AST representation.

use smol_str::SmolStr;

use super::string::Param;

/// A statement we know how to produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(Select),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
}

/// A SELECT clause
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub select_list: SelectList,
    pub from: From,
    pub joins: Vec<Join>,
    pub where_: Where,
    pub order_by: OrderBy,
    pub limit: Limit,
}

/// A select list
#[derive(Debug, Clone, PartialEq)]
pub enum SelectList {
    SelectList(Vec<(ColumnAlias, Expression)>),
    /// `COUNT(*)`
    Count,
}

/// A FROM clause
#[derive(Debug, Clone, PartialEq)]
pub struct From {
    pub table: TableName,
    pub alias: TableAlias,
}

/// A JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub enum Join {
    /// LEFT JOIN
    LeftOuterJoin(LeftOuterJoin),
}

/// A LEFT JOIN clause
#[derive(Debug, Clone, PartialEq)]
pub struct LeftOuterJoin {
    pub table: TableName,
    pub alias: TableAlias,
    pub on: Expression,
}

/// A WHERE clause. `None` means no WHERE clause is emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct Where(pub Option<Expression>);

/// An ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub elements: Vec<OrderByElement>,
}

/// A single element in an ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByElement {
    pub target: Expression,
    pub direction: OrderByDirection,
}

/// A direction for a single ORDER BY element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderByDirection {
    Asc,
    Desc,
}

/// LIMIT and OFFSET clauses. How they are spelled depends on the dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// An INSERT statement
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableName,
    pub columns: Vec<ColumnName>,
    pub values: Vec<Expression>,
}

/// An UPDATE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Update {
    pub table: TableName,
    pub set: Vec<(ColumnName, Expression)>,
    pub where_: KeyPredicates,
}

/// A DELETE statement
#[derive(Debug, Clone, PartialEq)]
pub struct Delete {
    pub table: TableName,
    pub where_: KeyPredicates,
}

/// Column equalities joined by AND, used to address a single row in mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPredicates(pub Vec<(ColumnName, Expression)>);

/// A scalar expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A binary operation on two scalar expressions
    BinaryOperation {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// An unary operation on a scalar expression
    UnaryOperation {
        operator: UnaryOperator,
        expression: Box<Expression>,
    },
    /// `<expression> LIKE <pattern>`
    Like {
        expression: Box<Expression>,
        pattern: Box<Expression>,
    },
    /// `<expression> IN (<list>)`
    InList {
        expression: Box<Expression>,
        list: Vec<Expression>,
    },
    /// A scalar function call
    FunctionCall {
        function: Function,
        args: Vec<Expression>,
    },
    /// A column reference
    ColumnReference(ColumnReference),
    /// A bound parameter, emitted as a positional placeholder
    Param(Param),
    /// The NULL literal
    Null,
    /// An integer constant written into the SQL text
    Integer(i64),
    /// An expression wrapped in parentheses
    Nested(Box<Expression>),
}

/// A binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    And,
    Or,
    Equals,
    NotEquals,
    Is,
    IsNot,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

/// An unary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// A scalar function, by its name in the target dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function(pub String);

/// A database table name, already resolved from the entity binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName(pub String);

/// A database table's column name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnName(pub String);

/// A reference to a column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnReference {
    /// A column qualified by the alias of its table
    TableColumn { table: TableAlias, name: ColumnName },
    /// A bare column, used by mutations which address a single table
    Column(ColumnName),
}

/// aliases that we give to relations
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableAlias {
    pub name: SmolStr,
}

/// aliases that we give to columns
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnAlias {
    pub name: String,
}
