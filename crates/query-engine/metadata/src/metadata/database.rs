//! Metadata information regarding the entity types and the tables that back them.

use std::collections::{BTreeMap, BTreeSet};

use enum_iterator::Sequence;
use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The logical scalar types a property can have.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum ScalarType {
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    Binary,
}

impl ScalarType {
    const OPERATORS_SUPPORTED_BY_ALL_TYPES: &'static [ComparisonOperator] = &[
        ComparisonOperator::Equals,
        ComparisonOperator::NotEquals,
    ];

    const ORDERED_OPERATORS: &'static [ComparisonOperator] = &[
        ComparisonOperator::LessThan,
        ComparisonOperator::LessThanOrEqualTo,
        ComparisonOperator::GreaterThan,
        ComparisonOperator::GreaterThanOrEqualTo,
    ];

    const ARITHMETIC_OPERATORS: &'static [ComparisonOperator] = &[ComparisonOperator::Arithmetic];

    const STRING_OPERATORS: &'static [ComparisonOperator] = &[ComparisonOperator::Like];

    /// Returns the complete set of operators that can be applied to a column of the given type.
    pub fn comparison_operators(&self) -> BTreeSet<ComparisonOperator> {
        let mut operators =
            BTreeSet::from_iter(Self::OPERATORS_SUPPORTED_BY_ALL_TYPES.iter().copied());
        match self {
            ScalarType::Boolean | ScalarType::Binary | ScalarType::Guid => {}
            ScalarType::String => {
                operators.extend(Self::ORDERED_OPERATORS.iter());
                operators.extend(Self::STRING_OPERATORS.iter());
            }
            ScalarType::DateTime | ScalarType::DateTimeOffset | ScalarType::Time => {
                operators.extend(Self::ORDERED_OPERATORS.iter());
            }
            _ => {
                operators.extend(Self::ORDERED_OPERATORS.iter());
                operators.extend(Self::ARITHMETIC_OPERATORS.iter());
            }
        }
        operators
    }

    /// Is this one of the integral types.
    pub fn is_integral(&self) -> bool {
        matches!(
            self,
            ScalarType::Byte
                | ScalarType::SByte
                | ScalarType::Int16
                | ScalarType::Int32
                | ScalarType::Int64
        )
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Edm.{self:?}")
    }
}

/// The kinds of operations a column type may take part in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    Like,
    Arithmetic,
}

/// Mapping from a fully-qualified entity type name to its binding.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct EntityTypes(pub BTreeMap<String, EntityTypeInfo>);

impl EntityTypes {
    pub fn empty() -> Self {
        EntityTypes(BTreeMap::new())
    }
}

/// How an entity type is stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntityTypeInfo {
    pub table_name: String,
    /// Key property names, in key order.
    pub keys: Vec<String>,
    /// Properties in declaration order. The order is the select-list order.
    pub properties: IndexMap<String, PropertyInfo>,
    #[serde(default)]
    pub navigations: BTreeMap<String, NavigationInfo>,
    /// Columns of this table that take part in a join towards another entity type,
    /// keyed by the other type's fully-qualified name.
    #[serde(default)]
    pub join_columns: BTreeMap<String, Vec<String>>,
    /// Many-to-many mapping tables towards another entity type.
    #[serde(default)]
    pub mapping_tables: BTreeMap<String, MappingTable>,
}

impl EntityTypeInfo {
    /// The properties which are backed by a column.
    pub fn persisted_properties(&self) -> impl Iterator<Item = (&String, &PropertyInfo)> {
        self.properties
            .iter()
            .filter(|(_, property)| !property.is_transient())
    }
}

/// Can this property contain null values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a single property of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropertyInfo {
    /// The backing column. A property without a column is transient (computed).
    #[serde(default)]
    pub column: Option<String>,
    pub r#type: ScalarType,
    #[serde(default)]
    pub nullable: Nullable,
    /// An explicit SQL type overriding the default one of `type`.
    #[serde(default)]
    pub sql_type: Option<String>,
}

impl PropertyInfo {
    pub fn is_transient(&self) -> bool {
        self.column.is_none()
    }
}

/// How many target entities a navigation leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Multiplicity {
    One,
    ZeroOrOne,
    #[default]
    Many,
}

/// A navigation property leading to another entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationInfo {
    pub target: String,
    #[serde(default)]
    pub multiplicity: Multiplicity,
}

/// A mapping table linking two entity types in a many-to-many association.
/// Both sides must declare the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MappingTable {
    pub table_name: String,
    /// Columns of the mapping table which reference the declaring entity.
    pub join_columns: Vec<String>,
}
