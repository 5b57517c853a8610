//! Errors for translation.

use query_engine_sql::sql::dialect::{DialectKind, UnsupportedFeature};

/// A type for translation errors. All of them are raised before any SQL is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Entity type '{0}' not found.")]
    EntityTypeNotFound(String),
    #[error("Property '{property}' of '{entity}' is not mapped.")]
    UnmappedProperty { entity: String, property: String },
    #[error("Navigation '{navigation}' not found in '{entity}'.")]
    NavigationNotFound { entity: String, navigation: String },
    #[error("Cannot order by the transient property '{property}' of '{entity}'.")]
    TransientPropertyInOrderBy { entity: String, property: String },
    #[error("Cannot filter on the transient property '{property}' of '{entity}'.")]
    TransientPropertyInFilter { entity: String, property: String },
    #[error("Expressions of kind {0} are not supported.")]
    UnsupportedExpressionKind(String),
    #[error("The arguments of '{method}' are in an order that cannot be translated.")]
    AmbiguousMethodArgumentOrder { method: String },
    #[error("'{method}' expects {expected} arguments but got {found}.")]
    InvalidMethodArity {
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("No join columns are declared between '{from}' and '{to}'.")]
    NoJoinColumns { from: String, to: String },
    #[error("'{from}' and '{to}' declare different mapping tables.")]
    MappingTableMismatch { from: String, to: String },
    #[error("Only one of '{from}' and '{to}' declares a mapping table.")]
    MissingMappingTable { from: String, to: String },
    #[error("Invalid skip token '{0}'.")]
    InvalidSkipToken(String),
    #[error("Invalid date/time literal '{0}'.")]
    InvalidDateTimeLiteral(String),
    #[error("Missing a value for the key property '{property}' of '{entity}'.")]
    MissingKeyPredicate { entity: String, property: String },
    #[error("Nothing to insert into '{0}'.")]
    EmptyInsert(String),
    #[error("Nothing to update in '{0}'.")]
    EmptyUpdate(String),
    #[error("Invalid request URL '{0}'.")]
    InvalidNextLinkUrl(String),
    #[error("{feature} is not supported by {dialect}.")]
    UnsupportedByDialect { dialect: DialectKind, feature: String },
}

impl From<UnsupportedFeature> for Error {
    fn from(unsupported: UnsupportedFeature) -> Self {
        Error::UnsupportedByDialect {
            dialect: unsupported.dialect,
            feature: unsupported.feature,
        }
    }
}
