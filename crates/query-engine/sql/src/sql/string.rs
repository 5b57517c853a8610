//! Type definitions of a low-level SQL string representation.

use chrono::{DateTime, NaiveTime, SecondsFormat, Utc};
use query_engine_metadata::metadata::ScalarType;

use super::dialect::{Dialect, PagingStyle};

/// A SQL string with positional `?` placeholders, and the parameters bound to them
/// in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct SQL {
    pub sql: String,
    pub params: Vec<Param>,
    quote_identifiers: bool,
    paging: PagingStyle,
}

impl Default for SQL {
    fn default() -> Self {
        Self::new(&Dialect::default())
    }
}

/// A parameter for a parameterized query.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub value: Value,
    /// The logical type of the literal the value came from.
    pub r#type: ScalarType,
    /// An explicit SQL type to bind the value as, taken from the column it is compared against.
    pub sql_type: Option<String>,
}

/// A parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Kept as text so no precision is lost.
    Decimal(String),
    String(String),
    /// Normalized to UTC at second precision.
    DateTime(DateTime<Utc>),
    Time(NaiveTime),
    Guid(String),
    Binary(Vec<u8>),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value}"),
            Value::Decimal(value) => write!(f, "{value}"),
            Value::String(value) | Value::Guid(value) => write!(f, "'{value}'"),
            Value::DateTime(value) => {
                write!(f, "'{}'", value.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            Value::Time(value) => write!(f, "'{}'", value.format("%H:%M:%S")),
            Value::Binary(bytes) => {
                write!(f, "X'")?;
                for byte in bytes {
                    write!(f, "{byte:02X}")?;
                }
                write!(f, "'")
            }
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.sql_type {
            None => write!(f, "{} ({})", self.value, self.r#type),
            Some(sql_type) => write!(f, "{} ({}, {})", self.value, self.r#type, sql_type),
        }
    }
}

impl SQL {
    pub fn new(dialect: &Dialect) -> SQL {
        SQL {
            sql: String::new(),
            params: vec![],
            quote_identifiers: dialect.case_sensitive_identifiers(),
            paging: dialect.paging_style(),
        }
    }
    pub fn append_syntax(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }
    /// Append a table, column or alias name. Names are only quoted when the dialect
    /// treats identifiers case-sensitively, and a name which is already quoted is kept as is.
    pub fn append_identifier(&mut self, name: &str) {
        if self.quote_identifiers {
            self.append_quoted(name);
        } else {
            self.sql.push_str(name);
        }
    }
    /// Append a name which is always quoted, such as a column alias.
    pub fn append_quoted(&mut self, name: &str) {
        if is_quoted(name) {
            self.sql.push_str(name);
        } else {
            self.sql.push('"');
            self.sql.push_str(name);
            self.sql.push('"');
        }
    }
    pub fn append_param(&mut self, param: Param) {
        self.sql.push('?');
        self.params.push(param);
    }
    pub fn paging_style(&self) -> PagingStyle {
        self.paging
    }
}

/// Is this name wrapped in double quotes already.
pub fn is_quoted(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('"') && name.ends_with('"')
}
