//! Helpers for processing requests and building SQL.

use query_engine_metadata::metadata;
use query_engine_sql::sql;

use super::error::Error;
use super::query::aliases::AliasRegistry;
use super::query::joins::JoinPlanner;

/// Static information from the configuration: the entity bindings, the dialect
/// and the server page size.
#[derive(Debug, Clone)]
pub struct Env<'a> {
    metadata: &'a metadata::Metadata,
    dialect: &'a sql::dialect::Dialect,
    server_page_size: u32,
}

/// Per-compilation state: the aliases granted so far and the joins planned so far.
/// A fresh `State` is made for every request and dropped with it.
#[derive(Debug)]
pub struct State {
    pub aliases: AliasRegistry,
    pub joins: JoinPlanner,
}

/// For an entity type in the query, we'd like to track what is its reference in the query
/// (the alias we generate) and what is its name in the metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameAndReference {
    /// Fully-qualified entity type name for property lookup
    pub name: String,
    /// Table alias to query from
    pub reference: sql::ast::TableAlias,
}

/// A property resolved through the binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo<'a> {
    pub table: &'a str,
    /// `None` for a transient property.
    pub column: Option<&'a str>,
    pub property: &'a metadata::PropertyInfo,
}

impl ColumnInfo<'_> {
    pub fn is_transient(&self) -> bool {
        self.column.is_none()
    }

    /// The explicit SQL type of the column, if the binding declares one.
    pub fn sql_type(&self) -> Option<String> {
        self.property.sql_type.clone()
    }
}

impl<'a> Env<'a> {
    /// Create a new Env by supplying the metadata, the dialect and the server page size.
    pub fn new(
        metadata: &'a metadata::Metadata,
        dialect: &'a sql::dialect::Dialect,
        server_page_size: u32,
    ) -> Env<'a> {
        Env {
            metadata,
            dialect,
            server_page_size,
        }
    }

    pub fn dialect(&self) -> &'a sql::dialect::Dialect {
        self.dialect
    }

    pub fn server_page_size(&self) -> u32 {
        self.server_page_size
    }

    /// Lookup an entity type's binding in the metadata.
    pub fn lookup_entity(&self, entity: &str) -> Result<&'a metadata::EntityTypeInfo, Error> {
        self.metadata
            .entity(entity)
            .ok_or_else(|| Error::EntityTypeNotFound(entity.to_string()))
    }

    /// Resolve a property to its table and column.
    pub fn resolve_column(&self, entity: &str, property: &str) -> Result<ColumnInfo<'a>, Error> {
        let info = self.lookup_entity(entity)?;
        let property_info =
            info.properties
                .get(property)
                .ok_or_else(|| Error::UnmappedProperty {
                    entity: entity.to_string(),
                    property: property.to_string(),
                })?;
        Ok(ColumnInfo {
            table: &info.table_name,
            column: property_info.column.as_deref(),
            property: property_info,
        })
    }

    /// The key properties of an entity type, in key order. Keys must be persisted.
    pub fn key_properties(&self, entity: &str) -> Result<Vec<(&'a str, ColumnInfo<'a>)>, Error> {
        let info = self.lookup_entity(entity)?;
        info.keys
            .iter()
            .map(|key| {
                let column = self.resolve_column(entity, key)?;
                if column.is_transient() {
                    Err(Error::UnmappedProperty {
                        entity: entity.to_string(),
                        property: key.clone(),
                    })
                } else {
                    Ok((key.as_str(), column))
                }
            })
            .collect()
    }

    /// The columns of the key properties, in key order.
    pub fn key_columns(&self, entity: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .key_properties(entity)?
            .into_iter()
            .filter_map(|(_, column)| column.column.map(str::to_string))
            .collect())
    }

    /// Lookup a navigation of an entity type.
    pub fn lookup_navigation(
        &self,
        entity: &str,
        navigation: &str,
    ) -> Result<&'a metadata::NavigationInfo, Error> {
        self.lookup_entity(entity)?
            .navigations
            .get(navigation)
            .ok_or_else(|| Error::NavigationNotFound {
                entity: entity.to_string(),
                navigation: navigation.to_string(),
            })
    }

    /// The columns joining `from` to `to`, pairwise: each side's declared join columns
    /// towards the other, or its key columns when it declares none. At least one side
    /// must declare them.
    pub fn resolve_association(
        &self,
        from: &str,
        to: &str,
    ) -> Result<(Vec<String>, Vec<String>), Error> {
        let from_info = self.lookup_entity(from)?;
        let to_info = self.lookup_entity(to)?;
        let (from_columns, to_columns) = match (
            from_info.join_columns.get(to),
            to_info.join_columns.get(from),
        ) {
            (None, None) => {
                return Err(Error::NoJoinColumns {
                    from: from.to_string(),
                    to: to.to_string(),
                })
            }
            (Some(from_columns), Some(to_columns)) => (from_columns.clone(), to_columns.clone()),
            (Some(from_columns), None) => (from_columns.clone(), self.key_columns(to)?),
            (None, Some(to_columns)) => (self.key_columns(from)?, to_columns.clone()),
        };
        if from_columns.is_empty() || from_columns.len() != to_columns.len() {
            return Err(Error::NoJoinColumns {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok((from_columns, to_columns))
    }
}

impl State {
    /// Start a compilation whose target entity type is `root`. The root always gets `T0`.
    pub fn new(root: &str) -> State {
        let mut aliases = AliasRegistry::new();
        aliases.alias_for(root);
        State {
            aliases,
            joins: JoinPlanner::new(root),
        }
    }

    /// An entity type and its alias, granting one if it has none yet.
    pub fn reference(&mut self, entity: &str) -> TableNameAndReference {
        TableNameAndReference {
            name: entity.to_string(),
            reference: self.aliases.alias_for(entity),
        }
    }

    /// Plan the join from `from` to `to`, if one is needed, and return `to`'s reference.
    pub fn join(
        &mut self,
        env: &Env,
        from: &str,
        to: &str,
    ) -> Result<TableNameAndReference, Error> {
        self.joins.join_for(env, &mut self.aliases, from, to)?;
        Ok(TableNameAndReference {
            name: to.to_string(),
            reference: self.aliases.alias_for(to),
        })
    }

    /// Follow a navigation path from `start`, joining every step.
    pub fn join_path(
        &mut self,
        env: &Env,
        start: &str,
        path: &[String],
    ) -> Result<TableNameAndReference, Error> {
        let mut current = self.reference(start);
        for navigation in path {
            let target = &env.lookup_navigation(&current.name, navigation)?.target;
            current = self.join(env, &current.name, target)?;
        }
        Ok(current)
    }
}

/// A column of an aliased table.
pub fn table_column(table: &TableNameAndReference, column: &str) -> sql::ast::Expression {
    sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::TableColumn {
        table: table.reference.clone(),
        name: sql::ast::ColumnName(column.to_string()),
    })
}
