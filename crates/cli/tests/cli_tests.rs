use std::fs;
use std::path::PathBuf;

use odata_sql_cli::{run, Command};
use odata_sql_configuration::environment::FixedEnvironment;
use tests_common::deployment::{get_path_from_project_root, SAMPLE_CONFIGURATION_PATH};

const FAILED_HEADERS: &str = r#"{
  "operation": "query",
  "entity": "com.sap.mpl.MessageProcessingLogHeader",
  "select": ["Status"],
  "filter": {
    "kind": "binary",
    "operator": "eq",
    "left": { "kind": "property", "name": "Status" },
    "right": { "kind": "literal", "literal": { "type": "String", "value": "FAILED" } }
  }
}"#;

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn translate_prints_sql_params_and_next_link() {
    let dir = tempfile::tempdir().unwrap();
    let request = write(&dir, "request.json", FAILED_HEADERS);

    let output = run(
        Command::Translate {
            configuration: get_path_from_project_root(SAMPLE_CONFIGURATION_PATH),
            request,
            url: Some(
                "http://localhost/odata/MessageProcessingLogs?$filter=Status%20eq%20%27FAILED%27"
                    .to_string(),
            ),
            pretty: false,
        },
        FixedEnvironment::default(),
    )
    .await
    .unwrap();

    similar_asserts::assert_eq!(
        output,
        "SELECT T0.MESSAGEGUID AS \"MESSAGEGUID_T0\", T0.STATUS AS \"STATUS_T0\" \
         FROM MPLHEADER AS T0 WHERE T0.STATUS = ? ORDER BY T0.MESSAGEGUID ASC LIMIT 1000\n\
         \n\
         1: 'FAILED' (Edm.String)\n\
         \n\
         next link (when the page is full): \
         http://localhost/odata/MessageProcessingLogs?$filter=Status%20eq%20%27FAILED%27&$skiptoken=1000"
    );
}

#[tokio::test]
async fn environment_overrides_reach_the_sql() {
    let dir = tempfile::tempdir().unwrap();
    let request = write(&dir, "request.json", FAILED_HEADERS);

    let output = run(
        Command::Count {
            configuration: get_path_from_project_root(SAMPLE_CONFIGURATION_PATH),
            request,
        },
        FixedEnvironment::from([(
            "DIRIGIBLE_DATABASE_NAMES_CASE_SENSITIVE".into(),
            "true".to_string(),
        )]),
    )
    .await
    .unwrap();

    similar_asserts::assert_eq!(
        output,
        "SELECT COUNT(*) FROM \"MPLHEADER\" AS \"T0\" WHERE \"T0\".\"STATUS\" = ?\n\
         \n\
         1: 'FAILED' (Edm.String)"
    );
}

#[tokio::test]
async fn only_reads_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let request = write(
        &dir,
        "request.json",
        r#"{
          "operation": "delete",
          "entity": "com.example.Entity4",
          "key": [{ "property": "Id1", "value": { "type": "Int", "value": 1 } }]
        }"#,
    );

    let error = run(
        Command::Count {
            configuration: get_path_from_project_root(SAMPLE_CONFIGURATION_PATH),
            request,
        },
        FixedEnvironment::default(),
    )
    .await
    .unwrap_err();
    assert_eq!(error.to_string(), "only reads can be counted");
}

#[tokio::test]
async fn materialize_folds_expanded_rows() {
    let dir = tempfile::tempdir().unwrap();
    let request = write(
        &dir,
        "request.json",
        r#"{
          "operation": "query",
          "entity": "com.sap.mpl.MessageProcessingLogHeader",
          "select": ["Status"],
          "expand": [["Attachments"]]
        }"#,
    );
    let rows = write(
        &dir,
        "rows.json",
        r#"[
          { "MESSAGEGUID_T0": "h1", "STATUS_T0": "FAILED", "ID_T1": "a1", "HEADERID_T1": "h1", "NAME_T1": "in.xml" },
          { "MESSAGEGUID_T0": "h1", "STATUS_T0": "FAILED", "ID_T1": "a2", "HEADERID_T1": "h1", "NAME_T1": "out.xml" },
          { "MESSAGEGUID_T0": "h2", "STATUS_T0": "COMPLETED", "ID_T1": null, "HEADERID_T1": null, "NAME_T1": null }
        ]"#,
    );

    let output = run(
        Command::Materialize {
            configuration: get_path_from_project_root(SAMPLE_CONFIGURATION_PATH),
            request,
            rows,
            url: Some("http://localhost/odata/MessageProcessingLogs".to_string()),
        },
        FixedEnvironment::default(),
    )
    .await
    .unwrap();

    let result: serde_json::Value = serde_json::from_str(&output).unwrap();
    similar_asserts::assert_eq!(
        result,
        serde_json::json!({
            "value": [
                {
                    "entity": "com.sap.mpl.MessageProcessingLogHeader",
                    "properties": { "MessageGuid": "h1", "Status": "FAILED" },
                    "expandData": {
                        "com.sap.mpl.MessageProcessingLogAttachment": [
                            {
                                "entity": "com.sap.mpl.MessageProcessingLogAttachment",
                                "properties": { "Id": "a1", "HeaderId": "h1", "Name": "in.xml" }
                            },
                            {
                                "entity": "com.sap.mpl.MessageProcessingLogAttachment",
                                "properties": { "Id": "a2", "HeaderId": "h1", "Name": "out.xml" }
                            }
                        ]
                    }
                },
                {
                    "entity": "com.sap.mpl.MessageProcessingLogHeader",
                    "properties": { "MessageGuid": "h2", "Status": "COMPLETED" }
                }
            ]
        })
    );
}

#[tokio::test]
async fn print_schema_describes_the_configuration() {
    let output = run(Command::PrintSchema, FixedEnvironment::default())
        .await
        .unwrap();
    let schema: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(schema["title"], "ParsedConfiguration");
    assert!(schema["properties"]["serverPageSize"].is_object());
}
