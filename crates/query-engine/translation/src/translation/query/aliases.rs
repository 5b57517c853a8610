//! Grant table aliases to the entity types a query references.

use query_engine_sql::sql;

/// One alias per distinct entity type, `T0`, `T1`, ... in first-reference order,
/// and one `MT<n>` alias per many-to-many mapping table.
/// An alias never changes once granted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AliasRegistry {
    entities: Vec<String>,
    mapping_tables: Vec<(String, String)>,
}

impl AliasRegistry {
    pub fn new() -> AliasRegistry {
        AliasRegistry::default()
    }

    /// The alias of an entity type, granted on first use.
    pub fn alias_for(&mut self, entity: &str) -> sql::ast::TableAlias {
        match self.lookup(entity) {
            Some(alias) => alias,
            None => {
                let alias = sql::helpers::make_table_alias(&format!("T{}", self.entities.len()));
                tracing::debug!("Grant alias '{}' for {}", alias.name, entity);
                self.entities.push(entity.to_string());
                alias
            }
        }
    }

    /// The alias of an entity type, if it has one.
    pub fn lookup(&self, entity: &str) -> Option<sql::ast::TableAlias> {
        self.entities
            .iter()
            .position(|granted| granted == entity)
            .map(|index| sql::helpers::make_table_alias(&format!("T{index}")))
    }

    /// The alias of the mapping table linking `from` to `to`, granted on first use.
    pub fn mapping_table_alias_for(&mut self, from: &str, to: &str) -> sql::ast::TableAlias {
        let index = match self
            .mapping_tables
            .iter()
            .position(|(granted_from, granted_to)| granted_from == from && granted_to == to)
        {
            Some(index) => index,
            None => {
                self.mapping_tables.push((from.to_string(), to.to_string()));
                self.mapping_tables.len() - 1
            }
        };
        sql::helpers::make_table_alias(&format!("MT{index}"))
    }

    /// Granted entity aliases in the order they were granted.
    pub fn entities(&self) -> impl Iterator<Item = (sql::ast::TableAlias, &str)> {
        self.entities.iter().enumerate().map(|(index, entity)| {
            (
                sql::helpers::make_table_alias(&format!("T{index}")),
                entity.as_str(),
            )
        })
    }
}
