//! The parsed entity requests the translation consumes. Parsing the protocol's URL
//! grammar into these types happens upstream.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A read of an entity set, a single entity, or the entities behind a navigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// The fully-qualified name of the entity type to read.
    pub entity: String,
    /// Read the entities reached by navigating from a single source entity: `/A(1)/Bs`.
    #[serde(default)]
    pub source: Option<NavigationSource>,
    /// Address a single entity by key: `/Entity(key)`.
    #[serde(default)]
    pub key: Vec<KeyValue>,
    /// Selected property names. Empty, or `*`, means all of them.
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default)]
    pub filter: Option<Expression>,
    #[serde(default)]
    pub order_by: Vec<OrderByItem>,
    /// Navigation paths to embed, each a list of navigation names starting at `entity`.
    #[serde(default)]
    pub expand: Vec<Vec<String>>,
    #[serde(default)]
    pub top: Option<u32>,
    #[serde(default)]
    pub skip: Option<u32>,
    #[serde(default)]
    pub skip_token: Option<String>,
}

impl QueryRequest {
    /// A request reading every entity of a type.
    pub fn new(entity: impl Into<String>) -> QueryRequest {
        QueryRequest {
            entity: entity.into(),
            source: None,
            key: vec![],
            select: vec![],
            filter: None,
            order_by: vec![],
            expand: vec![],
            top: None,
            skip: None,
            skip_token: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationSource {
    pub entity: String,
    pub key: Vec<KeyValue>,
    pub navigation: String,
}

/// One key property and its value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValue {
    pub property: String,
    pub value: Literal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderByItem {
    pub expression: Expression,
    #[serde(default)]
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

/// A filter or order-by expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Expression {
    Literal {
        literal: Literal,
    },
    /// A property of the entity being read.
    Property {
        name: String,
    },
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    /// A method call such as `startswith(Name,'A')`. The method name is kept as written.
    Method {
        method: String,
        arguments: Vec<Expression>,
    },
    /// A property reached through navigations: `Customer/Name`.
    Member {
        path: Vec<String>,
        property: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOperator {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// The `/` of a member access when a parser reports it as an operator.
    PropertyAccess,
}

impl BinaryOperator {
    /// Binding strength. A child binary expression with a strictly lower priority than
    /// its parent is parenthesized.
    pub fn priority(self) -> u8 {
        match self {
            BinaryOperator::PropertyAccess => 100,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 60,
            BinaryOperator::Add | BinaryOperator::Sub => 50,
            BinaryOperator::Lt | BinaryOperator::Gt | BinaryOperator::Le | BinaryOperator::Ge => 40,
            BinaryOperator::Eq | BinaryOperator::Ne => 30,
            BinaryOperator::And => 20,
            BinaryOperator::Or => 10,
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOperator {
    Not,
    Minus,
}

/// A typed literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i64),
    Double(f64),
    /// Kept as written to avoid losing precision.
    Decimal(String),
    String(String),
    /// `2023-01-31T10:00:00`, without an offset: read as UTC.
    DateTime(String),
    /// `2023-01-31T10:00:00+02:00`
    DateTimeOffset(String),
    /// `13:20:00`
    Time(String),
    Guid(String),
}

/// The values of a new entity, by property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertRequest {
    pub entity: String,
    pub values: IndexMap<String, Literal>,
}

/// New values for a single entity addressed by key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub entity: String,
    pub key: Vec<KeyValue>,
    pub values: IndexMap<String, Literal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub entity: String,
    pub key: Vec<KeyValue>,
}

/// Any request, tagged by its `operation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "camelCase")]
pub enum Request {
    Query(QueryRequest),
    Count(QueryRequest),
    Insert(InsertRequest),
    Update(UpdateRequest),
    Delete(DeleteRequest),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_deserialize_from_tagged_json() {
        let expression: Expression = serde_json::from_value(serde_json::json!({
            "kind": "binary",
            "operator": "eq",
            "left": { "kind": "property", "name": "Status" },
            "right": { "kind": "literal", "literal": { "type": "String", "value": "FAILED" } }
        }))
        .unwrap();

        assert_eq!(
            expression,
            Expression::Binary {
                operator: BinaryOperator::Eq,
                left: Box::new(Expression::Property {
                    name: "Status".to_string()
                }),
                right: Box::new(Expression::Literal {
                    literal: Literal::String("FAILED".to_string())
                }),
            }
        );

        let null: Literal = serde_json::from_value(serde_json::json!({ "type": "Null" })).unwrap();
        assert_eq!(null, Literal::Null);
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert!(BinaryOperator::And.priority() > BinaryOperator::Or.priority());
        assert!(BinaryOperator::Mul.priority() > BinaryOperator::Add.priority());
        assert!(BinaryOperator::PropertyAccess.priority() > BinaryOperator::Mul.priority());
    }
}
