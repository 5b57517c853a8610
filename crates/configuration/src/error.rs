//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use crate::environment::Variable;

/// The errors that can be thrown when parsing a configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
    #[error("Did not find expected version tag in {0}")]
    DidNotFindExpectedVersionTag(PathBuf),
    #[error("Unsupported configuration version: {0}")]
    UnsupportedVersion(String),
}

/// The errors that can be thrown when writing a parsed configuration.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The errors that can be thrown when turning a parsed configuration into a runtime one.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("invalid value {value:?} for the environment variable {variable}: {message}")]
    InvalidEnvironmentValue {
        variable: Variable,
        value: String,
        message: String,
    },
    #[error("{0}")]
    Environment(#[from] crate::environment::Error),
}
