//! Fold the rows of a read back into entities.
//!
//! Rows arrive ordered so that the rows of one entity are adjacent: one row per
//! combination of expanded children, with the entity's columns repeated on each.
//! The materializer holds one entity at a time, adds the expanded children of every
//! row sharing its key, and hands it out once a row with another key arrives.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use query_engine_metadata::metadata::ScalarType;
use query_engine_sql::sql::execution_plan::{EntityShape, ResultShape};

use crate::cursor::{Row, RowCursor};
use crate::error::Error;
use crate::metrics::Metrics;

static NULL: Value = Value::Null;

/// An entity read from the database, with the expanded entities nested under it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntity {
    /// The fully-qualified name of the entity type.
    pub entity: String,
    /// Property values in declaration order. Transient properties are null.
    pub properties: IndexMap<String, Value>,
    /// Expanded entities, keyed by the fully-qualified name of their entity type.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub expand_data: IndexMap<String, Vec<ResultEntity>>,
}

impl ResultEntity {
    fn key(&self, shape: &EntityShape) -> Vec<&Value> {
        identity(shape)
            .map(|name| self.properties.get(name).unwrap_or(&NULL))
            .collect()
    }

    /// Whether every identifying property is null: the outer join found no row.
    fn is_absent(&self, shape: &EntityShape) -> bool {
        self.key(shape).into_iter().all(Value::is_null)
    }
}

/// The properties identifying an entity: its key, or all properties for a keyless type.
fn identity(shape: &EntityShape) -> Box<dyn Iterator<Item = &str> + '_> {
    if shape.keys.is_empty() {
        Box::new(shape.properties.iter().map(|property| property.name.as_str()))
    } else {
        Box::new(shape.keys.iter().map(String::as_str))
    }
}

enum State {
    AwaitingRow,
    HaveCurrentEntity(ResultEntity),
    Done,
}

/// The entities of a cursor, one at a time. Dropping the stream early is fine: the
/// entity being built is dropped with it.
pub struct EntityStream<'a, C> {
    cursor: C,
    shape: &'a ResultShape,
    metrics: &'a Metrics,
    state: State,
}

impl<'a, C: RowCursor> EntityStream<'a, C> {
    pub fn new(cursor: C, shape: &'a ResultShape, metrics: &'a Metrics) -> Self {
        EntityStream {
            cursor,
            shape,
            metrics,
            state: State::AwaitingRow,
        }
    }

    /// Read rows until an entity is complete.
    fn advance(&mut self) -> Result<Option<ResultEntity>, Error> {
        loop {
            let Some(row) = self.cursor.next_row()? else {
                return Ok(match std::mem::replace(&mut self.state, State::Done) {
                    State::HaveCurrentEntity(entity) => Some(self.finish(entity)),
                    State::AwaitingRow | State::Done => None,
                });
            };
            self.metrics.rows_read_total.inc();

            let candidate = decode_entity(&self.shape.entity, &row)?;
            if candidate.is_absent(&self.shape.entity) {
                tracing::debug!("Skipping a row without a {}", self.shape.entity.entity);
                continue;
            }

            match std::mem::replace(&mut self.state, State::AwaitingRow) {
                State::HaveCurrentEntity(mut current)
                    if current.key(&self.shape.entity) == candidate.key(&self.shape.entity) =>
                {
                    self.fold_expands(&mut current, &row)?;
                    self.state = State::HaveCurrentEntity(current);
                }
                State::HaveCurrentEntity(finished) => {
                    let mut current = candidate;
                    self.fold_expands(&mut current, &row)?;
                    self.state = State::HaveCurrentEntity(current);
                    return Ok(Some(self.finish(finished)));
                }
                State::AwaitingRow | State::Done => {
                    let mut current = candidate;
                    self.fold_expands(&mut current, &row)?;
                    self.state = State::HaveCurrentEntity(current);
                }
            }
        }
    }

    fn finish(&self, entity: ResultEntity) -> ResultEntity {
        self.metrics.entities_materialized_total.inc();
        entity
    }

    /// Add the expanded entities of a row under `entity`. Each expand path nests one
    /// level per navigation; a path stops at the first segment the row has no entity for.
    fn fold_expands(&self, entity: &mut ResultEntity, row: &Row) -> Result<(), Error> {
        for path in &self.shape.expands {
            let mut parent = &mut *entity;
            for segment in path {
                let child = decode_entity(segment, row)?;
                if child.is_absent(segment) {
                    break;
                }
                let bucket = parent.expand_data.entry(segment.entity.clone()).or_default();
                let position = bucket
                    .iter()
                    .position(|existing| existing.key(segment) == child.key(segment));
                let index = match position {
                    Some(index) => index,
                    None => {
                        bucket.push(child);
                        self.metrics.expand_entities_total.inc();
                        bucket.len() - 1
                    }
                };
                parent = &mut bucket[index];
            }
        }
        Ok(())
    }
}

impl<C: RowCursor> Iterator for EntityStream<'_, C> {
    type Item = Result<ResultEntity, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if let State::Done = self.state {
            return None;
        }
        match self.advance() {
            Ok(entity) => entity.map(Ok),
            Err(error) => {
                self.state = State::Done;
                Some(Err(error))
            }
        }
    }
}

/// Read every entity of a cursor.
pub fn materialize(
    cursor: impl RowCursor,
    shape: &ResultShape,
    metrics: &Metrics,
) -> Result<Vec<ResultEntity>, Error> {
    let entities = EntityStream::new(cursor, shape, metrics).collect::<Result<Vec<_>, Error>>()?;
    tracing::debug!("Materialized {} entities", entities.len());
    Ok(entities)
}

fn decode_entity(shape: &EntityShape, row: &Row) -> Result<ResultEntity, Error> {
    let mut properties = IndexMap::new();
    for property in &shape.properties {
        let value = match &property.column {
            None => Value::Null,
            Some(alias) => {
                let value = row
                    .get(&alias.name)
                    .ok_or_else(|| Error::MissingColumn(alias.name.clone()))?;
                convert(value, property.r#type)
            }
        };
        properties.insert(property.name.clone(), value);
    }
    Ok(ResultEntity {
        entity: shape.entity.clone(),
        properties,
        expand_data: IndexMap::new(),
    })
}

/// Integers up to here convert from a float without loss.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// Narrow a database value to the property's type. Drivers hand out numeric columns
/// as decimals, which may arrive as floats or as text.
#[allow(clippy::cast_possible_truncation)]
fn convert(value: &Value, r#type: ScalarType) -> Value {
    match value {
        Value::Number(number) if r#type.is_integral() && number.as_i64().is_none() => number
            .as_f64()
            .filter(|float| float.fract() == 0.0 && float.abs() < MAX_EXACT_FLOAT)
            .map_or_else(|| value.clone(), |float| Value::from(float as i64)),
        Value::String(text) if r#type.is_integral() => parse_integral(text)
            .map_or_else(|| value.clone(), Value::from),
        Value::String(text) if matches!(r#type, ScalarType::Double | ScalarType::Single) => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| value.clone(), Value::Number),
        Value::Number(number) if r#type == ScalarType::Boolean => {
            number.as_i64().map_or_else(|| value.clone(), |flag| Value::Bool(flag != 0))
        }
        _ => value.clone(),
    }
}

/// `"10"` or `"10.000"`, but not `"10.5"`.
fn parse_integral(text: &str) -> Option<i64> {
    let text = text.trim();
    let (whole, fraction) = text.split_once('.').unwrap_or((text, ""));
    if !fraction.chars().all(|digit| digit == '0') {
        return None;
    }
    whole.parse().ok()
}
