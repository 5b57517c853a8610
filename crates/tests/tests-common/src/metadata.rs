//! The entity bindings of the sample configuration.

use query_engine_metadata::metadata::Metadata;
use serde::Deserialize;

const SAMPLE_CONFIGURATION: &str =
    include_str!("../../../../static/sample-configuration/configuration.json");

/// Message-processing log headers with their attachments, customers with orders and
/// order items, an entity with a composite key, and users and groups linked through a
/// mapping table.
pub fn sample_metadata() -> Metadata {
    // Read straight from the text: going through `serde_json::Value` would sort the
    // properties and lose their declaration order.
    #[derive(Deserialize)]
    struct SampleConfiguration {
        metadata: Metadata,
    }
    let configuration: SampleConfiguration = serde_json::from_str(SAMPLE_CONFIGURATION)
        .expect("sample configuration has valid metadata");
    configuration.metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_metadata_parses() {
        let metadata = sample_metadata();
        assert!(metadata
            .entity("com.sap.mpl.MessageProcessingLogHeader")
            .is_some());
        assert_eq!(
            metadata.entity("com.example.Entity4").map(|info| info.keys.len()),
            Some(2)
        );
    }

    #[test]
    fn properties_keep_their_declaration_order() {
        let metadata = sample_metadata();
        let attachment = metadata
            .entity("com.sap.mpl.MessageProcessingLogAttachment")
            .unwrap();
        assert_eq!(
            attachment.properties.keys().collect::<Vec<_>>(),
            vec!["Id", "HeaderId", "Name"]
        );
    }
}
