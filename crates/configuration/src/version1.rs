//! Version 1 of the configuration format.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tokio::fs;

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::DialectKind;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};

pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";
pub const DEFAULT_SERVER_PAGE_SIZE: u32 = 1000;

/// Overrides `caseSensitiveNames`.
pub const CASE_SENSITIVE_NAMES_VARIABLE: &str = "DIRIGIBLE_DATABASE_NAMES_CASE_SENSITIVE";
/// Overrides `serverPageSize`.
pub const SERVER_PAGE_SIZE_VARIABLE: &str = "DIRIGIBLE_ODATA_SERVER_PAGE_SIZE";

/// The configuration as stored in `configuration.json`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: Version,
    /// The database product SQL is generated for
    #[serde(default)]
    pub dialect: DialectKind,
    /// Quote table and column names, making them case-sensitive
    #[serde(default)]
    pub case_sensitive_names: bool,
    /// The largest number of entities a read returns before paging kicks in.
    /// Zero turns server paging off.
    #[serde(default = "default_server_page_size")]
    pub server_page_size: u32,
    #[serde(default)]
    pub metadata: metadata::Metadata,
}

fn default_server_page_size() -> u32 {
    DEFAULT_SERVER_PAGE_SIZE
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration {
            version: Version::This,
            dialect: DialectKind::default(),
            case_sensitive_names: false,
            server_page_size: DEFAULT_SERVER_PAGE_SIZE,
            metadata: metadata::Metadata::empty(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Serialize, JsonSchema)]
pub enum Version {
    #[serde(rename = "1")]
    This,
}

/// Just the version tag, read before the rest so that other versions get a clear error.
#[derive(Deserialize)]
struct VersionTag {
    version: Option<serde_json::Value>,
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parse_error = |error: serde_json::Error| ParseConfigurationError::ParseError {
        file_path: configuration_file.clone(),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    };

    let tag: VersionTag = serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;
    match tag.version {
        None => {
            return Err(ParseConfigurationError::DidNotFindExpectedVersionTag(
                configuration_file.clone(),
            ))
        }
        Some(serde_json::Value::String(version)) if version == "1" => {}
        Some(serde_json::Value::String(version)) => {
            return Err(ParseConfigurationError::UnsupportedVersion(version))
        }
        Some(other) => return Err(ParseConfigurationError::UnsupportedVersion(other.to_string())),
    }

    let parsed_config: ParsedConfiguration =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;
    tracing::debug!(
        "Parsed configuration with {} entity types",
        parsed_config.metadata.entity_types.0.len()
    );
    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, along with its JSON schema.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}
