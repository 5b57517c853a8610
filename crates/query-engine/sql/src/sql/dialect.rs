//! The capabilities of the database products we emit SQL for.

use std::collections::BTreeMap;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::string::is_quoted;

/// The database products we know about.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Postgres,
    H2,
    Derby,
    Hana,
    Sybase,
    MySql,
    Snowflake,
    MsSql,
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            DialectKind::Postgres => "PostgreSQL",
            DialectKind::H2 => "H2",
            DialectKind::Derby => "Derby",
            DialectKind::Hana => "HANA",
            DialectKind::Sybase => "Sybase",
            DialectKind::MySql => "MySQL",
            DialectKind::Snowflake => "Snowflake",
            DialectKind::MsSql => "SQL Server",
        };
        write!(f, "{name}")
    }
}

/// How `top` and `skip` are spelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagingStyle {
    /// `LIMIT n OFFSET m`
    LimitOffset,
    /// `OFFSET m ROWS FETCH NEXT n ROWS ONLY`
    OffsetFetch,
    /// `OFFSET m ROWS FETCH FIRST n ROWS ONLY`
    FetchFirst,
}

impl PagingStyle {
    /// Spell out a `top`/`skip` pair in this style.
    pub fn clause(self, top: Option<u32>, skip: Option<u32>) -> String {
        let top = top.filter(|top| *top > 0);
        let skip = skip.filter(|skip| *skip > 0);
        let mut parts: Vec<String> = vec![];
        match self {
            PagingStyle::LimitOffset => {
                if let Some(top) = top {
                    parts.push(format!("LIMIT {top}"));
                }
                if let Some(skip) = skip {
                    parts.push(format!("OFFSET {skip}"));
                }
            }
            PagingStyle::FetchFirst => {
                if let Some(skip) = skip {
                    parts.push(format!("OFFSET {skip} ROWS"));
                }
                if let Some(top) = top {
                    parts.push(format!("FETCH FIRST {top} ROWS ONLY"));
                }
            }
            PagingStyle::OffsetFetch => {
                if top.is_some() || skip.is_some() {
                    parts.push(format!("OFFSET {} ROWS", skip.unwrap_or(0)));
                }
                if let Some(top) = top {
                    parts.push(format!("FETCH NEXT {top} ROWS ONLY"));
                }
            }
        }
        parts.join(" ")
    }
}

/// Scalar functions a filter can translate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Sequence)]
pub enum ScalarFunction {
    Concat,
    Length,
    Upper,
    Lower,
    Mod,
}

/// A feature the dialect cannot express.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{feature} is not supported by {dialect}")]
pub struct UnsupportedFeature {
    pub dialect: DialectKind,
    pub feature: String,
}

/// The dialect descriptor: quoting rules, paging syntax, the scalar functions
/// available and sequence syntax. Built once per configuration and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    kind: DialectKind,
    case_sensitive: bool,
    paging: PagingStyle,
    functions: BTreeMap<ScalarFunction, &'static str>,
}

impl Default for Dialect {
    fn default() -> Self {
        Dialect::new(DialectKind::default(), false)
    }
}

impl Dialect {
    pub fn new(kind: DialectKind, case_sensitive: bool) -> Dialect {
        let paging = match kind {
            DialectKind::Derby => PagingStyle::FetchFirst,
            DialectKind::MsSql | DialectKind::Sybase => PagingStyle::OffsetFetch,
            _ => PagingStyle::LimitOffset,
        };
        Dialect {
            kind,
            case_sensitive,
            paging,
            functions: function_table(kind),
        }
    }

    pub fn kind(&self) -> DialectKind {
        self.kind
    }

    pub fn case_sensitive_identifiers(&self) -> bool {
        self.case_sensitive
    }

    pub fn paging_style(&self) -> PagingStyle {
        self.paging
    }

    /// Quote an identifier if names are case-sensitive. Idempotent.
    pub fn quote_identifier(&self, name: &str) -> String {
        if self.case_sensitive && !is_quoted(name) {
            format!("\"{name}\"")
        } else {
            name.to_string()
        }
    }

    /// The paging fragment for a `top`/`skip` pair, or an empty string when neither applies.
    /// A `skip` of zero means no offset and a `top` of zero means no limit.
    pub fn paging_clause(&self, top: Option<u32>, skip: Option<u32>) -> String {
        self.paging.clause(top, skip)
    }

    /// The name of a scalar function in this dialect, if it has one.
    pub fn function_name(&self, function: ScalarFunction) -> Option<&'static str> {
        self.functions.get(&function).copied()
    }

    /// Whether `a % b` is understood. Otherwise modulo goes through the `MOD` function.
    pub fn has_modulo_operator(&self) -> bool {
        !matches!(self.kind, DialectKind::Derby | DialectKind::Hana)
    }

    /// The statement reading the current value of a sequence.
    pub fn current_sequence_value(&self, sequence: &str) -> Result<String, UnsupportedFeature> {
        let sequence_name = self.quote_identifier(sequence);
        match self.kind {
            DialectKind::Postgres => Ok(format!("SELECT currval('{sequence_name}')")),
            DialectKind::H2 => Ok(format!("SELECT CURRVAL('{sequence_name}')")),
            DialectKind::Hana => Ok(format!("SELECT {sequence_name}.CURRVAL FROM DUMMY")),
            DialectKind::MsSql => Ok(format!(
                "SELECT current_value FROM sys.sequences WHERE name = '{sequence}'"
            )),
            DialectKind::Derby
            | DialectKind::MySql
            | DialectKind::Snowflake
            | DialectKind::Sybase => {
                Err(self.unsupported("reading the current value of a sequence"))
            }
        }
    }

    /// The statement advancing a sequence and reading its new value.
    pub fn next_sequence_value(&self, sequence: &str) -> Result<String, UnsupportedFeature> {
        let sequence_name = self.quote_identifier(sequence);
        match self.kind {
            DialectKind::Postgres => Ok(format!("SELECT nextval('{sequence_name}')")),
            DialectKind::H2 | DialectKind::MsSql => {
                Ok(format!("SELECT NEXT VALUE FOR {sequence_name}"))
            }
            DialectKind::Derby => Ok(format!("VALUES (NEXT VALUE FOR {sequence_name})")),
            DialectKind::Hana => Ok(format!("SELECT {sequence_name}.NEXTVAL FROM DUMMY")),
            DialectKind::Snowflake => Ok(format!("SELECT {sequence_name}.NEXTVAL")),
            DialectKind::MySql | DialectKind::Sybase => {
                Err(self.unsupported("reading the next value of a sequence"))
            }
        }
    }

    /// The statement reading the identity value generated by the last insert of this session.
    pub fn last_identity_value(&self) -> Result<String, UnsupportedFeature> {
        match self.kind {
            DialectKind::Postgres => Ok("SELECT lastval()".to_string()),
            DialectKind::Derby => Ok("VALUES IDENTITY_VAL_LOCAL()".to_string()),
            DialectKind::Hana => Ok("SELECT CURRENT_IDENTITY_VALUE() FROM DUMMY".to_string()),
            DialectKind::MySql => Ok("SELECT LAST_INSERT_ID()".to_string()),
            DialectKind::MsSql => Ok("SELECT SCOPE_IDENTITY()".to_string()),
            DialectKind::Sybase => Ok("SELECT @@IDENTITY".to_string()),
            DialectKind::H2 | DialectKind::Snowflake => {
                Err(self.unsupported("reading the last generated identity"))
            }
        }
    }

    fn unsupported(&self, feature: &str) -> UnsupportedFeature {
        UnsupportedFeature {
            dialect: self.kind,
            feature: feature.to_string(),
        }
    }
}

fn function_table(kind: DialectKind) -> BTreeMap<ScalarFunction, &'static str> {
    let mut functions = BTreeMap::from([
        (ScalarFunction::Upper, "UPPER"),
        (ScalarFunction::Lower, "LOWER"),
        (ScalarFunction::Mod, "MOD"),
    ]);
    match kind {
        DialectKind::MsSql | DialectKind::Sybase => {
            functions.insert(ScalarFunction::Length, "LEN");
            functions.insert(ScalarFunction::Concat, "CONCAT");
        }
        // Derby only knows the `||` operator.
        DialectKind::Derby => {
            functions.insert(ScalarFunction::Length, "LENGTH");
        }
        _ => {
            functions.insert(ScalarFunction::Length, "LENGTH");
            functions.insert(ScalarFunction::Concat, "CONCAT");
        }
    }
    functions
}
