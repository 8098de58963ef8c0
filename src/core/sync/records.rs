//! Input records and sync targets
//!
//! The input is a JSON document holding an array of records under a
//! configurable key:
//!
//! ```json
//! {"antibodies": [{"name": "AB-1", "Heavy Chain": "MAAS...", "Light Chain": "QVQL..."}]}
//! ```
//!
//! Each configured component field holds the residues of one dependent
//! sequence.

use crate::config::SyncConfig;
use crate::domain::{FolderId, RegistrarError, RegistryId, Result, SchemaId};
use serde_json::Value;
use std::path::Path;

/// One record to register
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub name: String,
    /// `(field, residues)` in configured field order
    pub components: Vec<(String, String)>,
}

impl SourceRecord {
    /// Residues for `field`
    pub fn component(&self, field: &str) -> Option<&str> {
        self.components
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, residues)| residues.as_str())
    }

    /// Name given to the dependent record created for `field`
    pub fn component_name(&self, field: &str) -> String {
        format!("{field} for {}", self.name)
    }
}

/// Parse records from a JSON document
pub fn parse_records(contents: &str, config: &SyncConfig) -> Result<Vec<SourceRecord>> {
    let doc: Value = serde_json::from_str(contents)?;
    let items = doc
        .get(&config.records_key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RegistrarError::Validation(format!(
                "input has no '{}' array",
                config.records_key
            ))
        })?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_record(index, item, &config.component_fields))
        .collect()
}

/// Read and parse a records file
pub async fn load_records(path: impl AsRef<Path>, config: &SyncConfig) -> Result<Vec<SourceRecord>> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        RegistrarError::Io(format!("Failed to read {}: {e}", path.display()))
    })?;
    let records = parse_records(&contents, config)?;
    tracing::info!(path = %path.display(), records = records.len(), "Loaded input records");
    Ok(records)
}

fn parse_record(index: usize, item: &Value, fields: &[String]) -> Result<SourceRecord> {
    let name = item
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| RegistrarError::Validation(format!("record {index} has no name")))?;

    let components = fields
        .iter()
        .map(|field| {
            let residues = item
                .get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    RegistrarError::Validation(format!("record '{name}' has no '{field}'"))
                })?;
            Ok((field.clone(), residues.to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(SourceRecord {
        name: name.to_string(),
        components,
    })
}

/// Where records are created and registered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncTargets {
    pub folder_id: FolderId,
    pub registry_id: RegistryId,
    pub composite_schema_id: SchemaId,
    pub component_schema_id: SchemaId,
}

impl SyncTargets {
    /// Resolve targets from the `[sync]` section
    ///
    /// # Errors
    ///
    /// `Configuration` naming every missing identifier.
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let mut missing = Vec::new();
        let mut require = |value: &Option<String>, key: &str| -> String {
            match value.as_deref().map(str::trim) {
                Some(v) if !v.is_empty() => v.to_string(),
                _ => {
                    missing.push(key.to_string());
                    String::new()
                }
            }
        };

        let folder = require(&config.folder_id, "folder_id");
        let registry = require(&config.registry_id, "registry_id");
        let composite = require(&config.composite_schema_id, "composite_schema_id");
        let component = require(&config.component_schema_id, "component_schema_id");

        if !missing.is_empty() {
            return Err(RegistrarError::Configuration(format!(
                "missing sync settings: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            folder_id: FolderId::new(folder).map_err(RegistrarError::Configuration)?,
            registry_id: RegistryId::new(registry).map_err(RegistrarError::Configuration)?,
            composite_schema_id: SchemaId::new(composite).map_err(RegistrarError::Configuration)?,
            component_schema_id: SchemaId::new(component).map_err(RegistrarError::Configuration)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_records() {
        let input = r#"{"antibodies": [
            {"name": "AB-1", "Heavy Chain": "MAAS", "Light Chain": "QVQL"},
            {"name": "AB-2", "Heavy Chain": "EVQL", "Light Chain": "DIQM", "Note": "ignored"}
        ]}"#;

        let records = parse_records(input, &SyncConfig::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].component("Heavy Chain"), Some("MAAS"));
        assert_eq!(records[1].component("Light Chain"), Some("DIQM"));
        assert_eq!(records[0].component_name("Heavy Chain"), "Heavy Chain for AB-1");
    }

    #[test]
    fn test_missing_component_is_rejected() {
        let input = r#"{"antibodies": [{"name": "AB-1", "Heavy Chain": "MAAS"}]}"#;
        let err = parse_records(input, &SyncConfig::default()).unwrap_err();
        assert!(err.to_string().contains("Light Chain"));
    }

    #[test]
    fn test_custom_records_key() {
        let config = SyncConfig {
            records_key: "constructs".to_string(),
            component_fields: vec!["Chain".to_string()],
            ..Default::default()
        };
        let input = r#"{"constructs": [{"name": "C-1", "Chain": "MKT"}]}"#;
        let records = parse_records(input, &config).unwrap();
        assert_eq!(records[0].components, vec![("Chain".to_string(), "MKT".to_string())]);

        assert!(parse_records(r#"{"antibodies": []}"#, &config).is_err());
    }

    #[test]
    fn test_targets_report_every_missing_id() {
        let config = SyncConfig {
            folder_id: Some("lib_1".to_string()),
            ..Default::default()
        };
        let err = SyncTargets::from_config(&config).unwrap_err().to_string();
        assert!(err.contains("registry_id"));
        assert!(err.contains("composite_schema_id"));
        assert!(err.contains("component_schema_id"));
        assert!(!err.contains("folder_id"));
    }

    #[tokio::test]
    async fn test_load_records_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        write!(file, r#"{{"antibodies": [{{"name": "AB-1", "Heavy Chain": "MAAS", "Light Chain": "QVQL"}}]}}"#).unwrap();

        let records = load_records(file.path(), &SyncConfig::default()).await.unwrap();
        assert_eq!(records.len(), 1);
    }
}
