use std::fs;
use std::path::PathBuf;

use odata_sql_configuration::environment::FixedEnvironment;
use query_engine_translation::translation;
use tests_common::deployment::{get_path_from_project_root, SAMPLE_CONFIGURATION_PATH};

/// Translate the request of a goldenfile directory and render the SQL with its
/// numbered parameters. A goldenfile may carry its own `configuration.json`;
/// otherwise the sample configuration is used.
pub async fn test_translation(testname: &str) -> anyhow::Result<String> {
    let directory = PathBuf::from("tests/goldenfiles").join(testname);
    let configuration_directory = if directory.join("configuration.json").exists() {
        directory.clone()
    } else {
        get_path_from_project_root(SAMPLE_CONFIGURATION_PATH)
    };

    let parsed_configuration =
        odata_sql_configuration::parse_configuration(&configuration_directory).await?;
    let configuration = odata_sql_configuration::make_runtime_configuration(
        parsed_configuration,
        FixedEnvironment::default(),
    )?;
    let env = translation::helpers::Env::new(
        &configuration.metadata,
        &configuration.dialect,
        configuration.server_page_size,
    );

    let request: translation::request::Request =
        serde_json::from_str(&fs::read_to_string(directory.join("request.json"))?)?;

    let plan = translation::translate(&env, &request)?;
    let query = plan.query_sql(&configuration.dialect);
    let params = query
        .params
        .iter()
        .enumerate()
        .map(|(i, param)| format!("{}: {}", i + 1, param))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!("{}\n\n{}", query.sql, params))
}
