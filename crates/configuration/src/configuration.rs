//! Configuration for the query compiler.

use query_engine_metadata::metadata;
use query_engine_sql::sql::dialect::Dialect;

use crate::environment::{self, Environment, Variable};
use crate::error::MakeRuntimeConfigurationError;
use crate::version1::{self, ParsedConfiguration};

/// The 'Configuration' type collects all the information necessary to compile queries at runtime.
///
/// 'ParsedConfiguration' is the serialized format. Values of this type are produced from a
/// 'ParsedConfiguration' using 'make_runtime_configuration', after environment overrides apply.
#[derive(Debug, Clone)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
    pub dialect: Dialect,
    pub server_page_size: u32,
}

/// Apply the environment overrides and build the dialect descriptor.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let case_sensitive = read_override(
        &environment,
        version1::CASE_SENSITIVE_NAMES_VARIABLE,
        |value| match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err("expected true or false".to_string()),
        },
    )?
    .unwrap_or(parsed_config.case_sensitive_names);

    let server_page_size = read_override(
        &environment,
        version1::SERVER_PAGE_SIZE_VARIABLE,
        |value| value.trim().parse::<u32>().map_err(|error| error.to_string()),
    )?
    .unwrap_or(parsed_config.server_page_size);

    Ok(Configuration {
        metadata: parsed_config.metadata,
        dialect: Dialect::new(parsed_config.dialect, case_sensitive),
        server_page_size,
    })
}

/// Read and parse a variable. An unset variable is no override.
fn read_override<T>(
    environment: &impl Environment,
    name: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<Option<T>, MakeRuntimeConfigurationError> {
    let variable = Variable::from(name);
    let value = match environment.read(&variable) {
        Ok(value) => value,
        Err(environment::Error::VariableNotPresent(_)) => return Ok(None),
        Err(error) => return Err(error.into()),
    };
    parse(&value)
        .map(Some)
        .map_err(|message| MakeRuntimeConfigurationError::InvalidEnvironmentValue {
            variable,
            value,
            message,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::FixedEnvironment;
    use query_engine_sql::sql::dialect::DialectKind;

    #[test]
    fn environment_overrides_the_file() {
        let mut parsed = ParsedConfiguration::initial();
        parsed.dialect = DialectKind::Hana;
        let configuration = make_runtime_configuration(
            parsed,
            FixedEnvironment::from([
                (
                    version1::CASE_SENSITIVE_NAMES_VARIABLE.into(),
                    "TRUE".to_string(),
                ),
                (version1::SERVER_PAGE_SIZE_VARIABLE.into(), "50".to_string()),
            ]),
        )
        .unwrap();
        assert!(configuration.dialect.case_sensitive_identifiers());
        assert_eq!(configuration.dialect.kind(), DialectKind::Hana);
        assert_eq!(configuration.server_page_size, 50);
    }

    #[test]
    fn unset_variables_keep_the_file_values() {
        let configuration =
            make_runtime_configuration(ParsedConfiguration::initial(), FixedEnvironment::default())
                .unwrap();
        assert!(!configuration.dialect.case_sensitive_identifiers());
        assert_eq!(
            configuration.server_page_size,
            version1::DEFAULT_SERVER_PAGE_SIZE
        );
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let result = make_runtime_configuration(
            ParsedConfiguration::initial(),
            FixedEnvironment::from([(
                version1::SERVER_PAGE_SIZE_VARIABLE.into(),
                "lots".to_string(),
            )]),
        );
        assert!(matches!(
            result,
            Err(MakeRuntimeConfigurationError::InvalidEnvironmentValue { value, .. }) if value == "lots"
        ));
    }
}
