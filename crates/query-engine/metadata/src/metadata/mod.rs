//! Metadata information regarding the entity model and how it binds to database tables.

pub mod database;

// re-export without modules
pub use database::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadata information.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub entity_types: EntityTypes,
}

impl Metadata {
    pub fn empty() -> Self {
        Metadata {
            entity_types: EntityTypes::empty(),
        }
    }

    /// Lookup the binding of an entity type by its fully-qualified name.
    pub fn entity(&self, fqn: &str) -> Option<&EntityTypeInfo> {
        self.entity_types.0.get(fqn)
    }
}
