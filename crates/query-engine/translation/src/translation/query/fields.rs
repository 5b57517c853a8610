//! Translate the selected properties and the expanded navigations of a request to a
//! select list, and describe how the result rows map back onto entities.

use indexmap::IndexMap;

use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{EntityShape, PropertyShape, ResultShape};

use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// The select list under construction: one item per column alias.
#[derive(Debug, Default)]
struct SelectList {
    items: IndexMap<String, sql::ast::Expression>,
}

impl SelectList {
    fn push(&mut self, alias: sql::ast::ColumnAlias, expression: sql::ast::Expression) {
        self.items.entry(alias.name).or_insert(expression);
    }

    fn into_items(self) -> Vec<(sql::ast::ColumnAlias, sql::ast::Expression)> {
        self.items
            .into_iter()
            .map(|(name, expression)| (sql::ast::ColumnAlias { name }, expression))
            .collect()
    }
}

/// Translate the select list: the root entity's selected properties first, then the
/// properties of every entity type along each expand path, in declaration order.
pub fn translate_fields(
    env: &Env,
    state: &mut State,
    root: &TableNameAndReference,
    select: &[String],
    expand: &[Vec<String>],
) -> Result<(Vec<(sql::ast::ColumnAlias, sql::ast::Expression)>, ResultShape), Error> {
    let mut select_list = SelectList::default();

    let entity = entity_shape(env, root, selection(select), &mut select_list)?;

    let mut expands = vec![];
    for path in expand {
        let mut segments = vec![];
        let mut current = root.clone();
        for navigation in path {
            let target = &env.lookup_navigation(&current.name, navigation)?.target;
            current = state.join(env, &current.name, target)?;
            segments.push(entity_shape(env, &current, None, &mut select_list)?);
        }
        expands.push(segments);
    }

    Ok((select_list.into_items(), ResultShape { entity, expands }))
}

/// `None` selects every property.
fn selection(select: &[String]) -> Option<&[String]> {
    if select.is_empty() || select.iter().any(|name| name == "*") {
        None
    } else {
        Some(select)
    }
}

fn entity_shape(
    env: &Env,
    table: &TableNameAndReference,
    selection: Option<&[String]>,
    select_list: &mut SelectList,
) -> Result<EntityShape, Error> {
    let info = env.lookup_entity(&table.name)?;

    if let Some(selection) = selection {
        if let Some(unknown) = selection
            .iter()
            .find(|name| !info.properties.contains_key(name.as_str()))
        {
            return Err(Error::UnmappedProperty {
                entity: table.name.clone(),
                property: unknown.clone(),
            });
        }
    }

    // keys are always selected
    let keys = env.key_properties(&table.name)?;
    let is_selected = |name: &String| {
        selection.map_or(true, |selection| selection.contains(name))
            || keys.iter().any(|(key, _)| *key == name.as_str())
    };

    let mut properties = vec![];
    for (name, property) in info.properties.iter().filter(|(name, _)| is_selected(name)) {
        let column = match &property.column {
            None => None,
            Some(column) => {
                let (alias, expression) = sql::helpers::make_column(
                    table.reference.clone(),
                    sql::ast::ColumnName(column.clone()),
                );
                select_list.push(alias.clone(), expression);
                Some(alias)
            }
        };
        properties.push(PropertyShape {
            name: name.clone(),
            r#type: property.r#type,
            column,
        });
    }

    Ok(EntityShape {
        entity: table.name.clone(),
        keys: keys.into_iter().map(|(key, _)| key.to_string()).collect(),
        properties,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_engine_sql::sql::dialect::Dialect;

    const HEADER: &str = "com.sap.mpl.MessageProcessingLogHeader";

    fn aliases(items: &[(sql::ast::ColumnAlias, sql::ast::Expression)]) -> Vec<&str> {
        items.iter().map(|(alias, _)| alias.name.as_str()).collect()
    }

    #[test]
    fn selection_always_includes_the_key() {
        let metadata = tests_common::metadata::sample_metadata();
        let dialect = Dialect::default();
        let env = Env::new(&metadata, &dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);

        let (items, shape) =
            translate_fields(&env, &mut state, &root, &["Status".to_string()], &[]).unwrap();
        similar_asserts::assert_eq!(aliases(&items), vec!["MESSAGEGUID_T0", "STATUS_T0"]);
        assert_eq!(shape.entity.keys, vec!["MessageGuid"]);
        assert!(shape.expands.is_empty());
    }

    #[test]
    fn star_selects_every_persisted_property_and_keeps_transients_in_the_shape() {
        let metadata = tests_common::metadata::sample_metadata();
        let dialect = Dialect::default();
        let env = Env::new(&metadata, &dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);

        let (items, shape) =
            translate_fields(&env, &mut state, &root, &["*".to_string()], &[]).unwrap();
        assert!(!aliases(&items).contains(&"DURATION_T0"));
        let duration = shape.entity.property("Duration").unwrap();
        assert_eq!(duration.column, None);
    }

    #[test]
    fn expanded_types_are_joined_and_selected() {
        let metadata = tests_common::metadata::sample_metadata();
        let dialect = Dialect::default();
        let env = Env::new(&metadata, &dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);

        let (items, shape) = translate_fields(
            &env,
            &mut state,
            &root,
            &["Status".to_string()],
            &[vec!["Attachments".to_string()]],
        )
        .unwrap();
        similar_asserts::assert_eq!(
            aliases(&items),
            vec!["MESSAGEGUID_T0", "STATUS_T0", "ID_T1", "HEADERID_T1", "NAME_T1"]
        );
        assert_eq!(shape.expands.len(), 1);
        assert_eq!(
            shape.expands[0][0].entity,
            "com.sap.mpl.MessageProcessingLogAttachment"
        );
        assert_eq!(state.joins.edges().len(), 1);
    }

    #[test]
    fn unknown_selections_are_rejected() {
        let metadata = tests_common::metadata::sample_metadata();
        let dialect = Dialect::default();
        let env = Env::new(&metadata, &dialect, 1000);
        let mut state = State::new(HEADER);
        let root = state.reference(HEADER);
        assert!(matches!(
            translate_fields(&env, &mut state, &root, &["Nope".to_string()], &[]),
            Err(Error::UnmappedProperty { .. })
        ));
    }
}
