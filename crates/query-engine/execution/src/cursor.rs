//! The rows a database driver hands back.

use crate::error::Error;

/// One result row: column alias to value.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A forward-only cursor over the rows of one executed query. Rows come in the order
/// of the query's ORDER BY.
pub trait RowCursor {
    /// The next row, or `None` once the cursor is exhausted.
    fn next_row(&mut self) -> Result<Option<Row>, Error>;
}

/// A cursor over rows already in memory.
#[derive(Debug, Default)]
pub struct VecCursor {
    rows: std::vec::IntoIter<Row>,
}

impl VecCursor {
    pub fn new(rows: Vec<Row>) -> VecCursor {
        VecCursor {
            rows: rows.into_iter(),
        }
    }

    /// Read rows from a JSON array of objects keyed by column alias.
    pub fn from_json(value: serde_json::Value) -> Result<VecCursor, Error> {
        let serde_json::Value::Array(values) = value else {
            return Err(Error::Cursor("expected an array of rows".to_string()));
        };
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(index, value)| match value {
                serde_json::Value::Object(row) => Ok(row),
                _ => Err(Error::Cursor(format!("row {index} is not an object"))),
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(VecCursor::new(rows))
    }
}

impl RowCursor for VecCursor {
    fn next_row(&mut self) -> Result<Option<Row>, Error> {
        Ok(self.rows.next())
    }
}
