//! Bulk registration through asynchronous bulk-create tasks
//!
//! One `aa-sequences:bulk-create` task per component field registers every
//! record's component of that kind, then a single
//! `custom-entities:bulk-create` task registers the composites with fields
//! pointing at the components' registry identities. A failed task stops the
//! run: later groups and the composite task are never submitted.

use super::records::{SourceRecord, SyncTargets};
use super::summary::{RegisteredRecord, SyncSummary};
use crate::adapters::registry::models::TaskHandle;
use crate::adapters::registry::RegistryClient;
use crate::config::SyncConfig;
use crate::core::reconcile::pair_by_position;
use crate::core::task::TaskPoller;
use crate::domain::{resources_under, RegistrarError, RemoteError, RemoteResource, Result};
use serde_json::{json, Map, Value};
use std::time::Instant;

/// Bulk registration of composite records and their components
#[derive(Debug, Clone)]
pub struct BulkRegistration {
    client: RegistryClient,
    poller: TaskPoller,
    targets: SyncTargets,
    component_fields: Vec<String>,
    naming_strategy: String,
    registry_field: String,
}

impl BulkRegistration {
    pub fn new(
        client: RegistryClient,
        poller: TaskPoller,
        targets: SyncTargets,
        config: &SyncConfig,
    ) -> Self {
        Self {
            client,
            poller,
            targets,
            component_fields: config.component_fields.clone(),
            naming_strategy: config.naming_strategy.clone(),
            registry_field: config.registry_field.clone(),
        }
    }

    /// Register `records`
    ///
    /// # Errors
    ///
    /// `TaskFailed` for the first failed task, `ResponseMismatch` if a task
    /// returns a different number of entities than were submitted, or any
    /// transport error. Nothing after the failing step is submitted.
    pub async fn run(&self, records: &[SourceRecord]) -> Result<SyncSummary> {
        let started = Instant::now();
        let mut summary = SyncSummary::new(records.len());

        if records.is_empty() {
            tracing::info!("No records to register");
            return Ok(summary.with_duration(started.elapsed()));
        }

        let mut components: Vec<(String, Vec<RemoteResource>)> = Vec::new();
        for field in &self.component_fields {
            let registered = self.register_components(field, records).await?;
            summary.components_created += registered.len();
            components.push((field.clone(), registered));
        }

        let composites = self.register_composites(records, &components).await?;

        for (index, (record, composite)) in records.iter().zip(&composites).enumerate() {
            let component_ids = components
                .iter()
                .map(|(field, resources)| {
                    (
                        field.clone(),
                        self.identity(&resources[index]).map(str::to_string),
                    )
                })
                .collect();

            summary.add_registered(RegisteredRecord {
                name: record.name.clone(),
                registry_id: self.identity(composite).map(str::to_string),
                components: component_ids,
            });
        }

        Ok(summary.with_duration(started.elapsed()))
    }

    async fn register_components(
        &self,
        field: &str,
        records: &[SourceRecord],
    ) -> Result<Vec<RemoteResource>> {
        let items = records
            .iter()
            .map(|record| {
                let residues = record.component(field).ok_or_else(|| {
                    RegistrarError::Validation(format!(
                        "record '{}' has no '{field}'",
                        record.name
                    ))
                })?;
                Ok(json!({
                    "aminoAcids": residues,
                    "folderId": self.targets.folder_id,
                    "name": record.component_name(field),
                    "schemaId": self.targets.component_schema_id,
                    "registryId": self.targets.registry_id,
                    "namingStrategy": self.naming_strategy,
                }))
            })
            .collect::<Result<Vec<Value>>>()?;

        tracing::info!(field, count = items.len(), "Submitting component bulk create");

        let response = self
            .submit("aa-sequences:bulk-create", json!({ "aaSequences": items }))
            .await
            .map_err(|e| {
                tracing::error!(field, error = %e, "Could not register components");
                e
            })?;

        let created = resources_under(&response, "aaSequences")?;
        let paired = pair_by_position(&format!("{field} bulk create"), records.to_vec(), created)?;

        let resources: Vec<RemoteResource> = paired.into_iter().map(|(_, r)| r).collect();
        for resource in &resources {
            self.require_identity(resource, field)?;
        }

        tracing::info!(field, count = resources.len(), "Registered components");
        Ok(resources)
    }

    async fn register_composites(
        &self,
        records: &[SourceRecord],
        components: &[(String, Vec<RemoteResource>)],
    ) -> Result<Vec<RemoteResource>> {
        let items: Vec<Value> = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let mut fields = Map::new();
                for (field, resources) in components {
                    let identity = self.identity(&resources[index]).unwrap_or_default();
                    fields.insert(field.clone(), json!({ "value": identity }));
                }
                json!({
                    "name": record.name,
                    "schemaId": self.targets.composite_schema_id,
                    "folderId": self.targets.folder_id,
                    "registryId": self.targets.registry_id,
                    "namingStrategy": self.naming_strategy,
                    "fields": fields,
                })
            })
            .collect();

        tracing::info!(count = items.len(), "Submitting composite bulk create");

        let response = self
            .submit("custom-entities:bulk-create", json!({ "customEntities": items }))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Could not register composite records");
                e
            })?;

        let created = resources_under(&response, "customEntities")?;
        let paired = pair_by_position("composite bulk create", records.to_vec(), created)?;
        Ok(paired.into_iter().map(|(_, r)| r).collect())
    }

    async fn submit(&self, path: &str, body: Value) -> Result<Value> {
        let reply = self.client.post(path, &body).await?;
        let handle: TaskHandle = serde_json::from_value(reply).map_err(|e| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "{path} did not return a task: {e}"
            )))
        })?;
        tracing::debug!(path, task_id = %handle.task_id, "Bulk task submitted");
        self.poller.wait_for_success(&handle).await
    }

    fn identity<'a>(&self, resource: &'a RemoteResource) -> Option<&'a str> {
        resource.registry_identity_in(&self.registry_field)
    }

    fn require_identity<'a>(&self, resource: &'a RemoteResource, field: &str) -> Result<&'a str> {
        self.identity(resource).ok_or_else(|| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "{field} {} was created without {}",
                resource.id().unwrap_or("<unknown>"),
                self.registry_field
            )))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::scripted::{Method, ScriptedTransport};
    use crate::core::backoff::BackoffPolicy;
    use crate::core::cancel::CancelToken;
    use std::sync::Arc;
    use std::time::Duration;

    fn targets() -> SyncTargets {
        SyncTargets::from_config(&SyncConfig {
            folder_id: Some("lib_1".to_string()),
            registry_id: Some("src_1".to_string()),
            composite_schema_id: Some("ts_antibody".to_string()),
            component_schema_id: Some("ts_chain".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn records() -> Vec<SourceRecord> {
        ["AB-1", "AB-2"]
            .iter()
            .enumerate()
            .map(|(i, name)| SourceRecord {
                name: name.to_string(),
                components: vec![
                    ("Heavy Chain".to_string(), format!("MAAS{i}")),
                    ("Light Chain".to_string(), format!("QVQL{i}")),
                ],
            })
            .collect()
    }

    fn registration(transport: &Arc<ScriptedTransport>) -> BulkRegistration {
        let client = RegistryClient::new(
            transport.clone(),
            BackoffPolicy::default(),
            CancelToken::none(),
        );
        let poller = TaskPoller::new(client.clone(), Duration::from_secs(10), None);
        BulkRegistration::new(client, poller, targets(), &SyncConfig::default())
    }

    fn sequences(prefix: &str) -> Value {
        json!({"aaSequences": [
            {"id": format!("{prefix}_1"), "entityRegistryId": format!("{prefix}001")},
            {"id": format!("{prefix}_2"), "entityRegistryId": format!("{prefix}002")}
        ]})
    }

    #[tokio::test(start_paused = true)]
    async fn test_registers_components_then_composites() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_post("aa-sequences:bulk-create", json!({"taskId": "t_heavy"}))
            .on_post("aa-sequences:bulk-create", json!({"taskId": "t_light"}))
            .on_post("custom-entities:bulk-create", json!({"taskId": "t_ab"}))
            .on_get("tasks/t_heavy", json!({"status": "RUNNING"}))
            .on_get("tasks/t_heavy", json!({"status": "SUCCEEDED", "response": sequences("HC")}))
            .on_get("tasks/t_light", json!({"status": "SUCCEEDED", "response": sequences("LC")}))
            .on_get(
                "tasks/t_ab",
                json!({"status": "SUCCEEDED", "response": {"customEntities": [
                    {"id": "bfi_1", "entityRegistryId": "AB001"},
                    {"id": "bfi_2", "entityRegistryId": "AB002"}
                ]}}),
            );

        let summary = registration(&transport).run(&records()).await.unwrap();

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.components_created, 4);
        assert_eq!(summary.registered[1].registry_id.as_deref(), Some("AB002"));
        assert_eq!(
            summary.registered[1].components,
            vec![
                ("Heavy Chain".to_string(), Some("HC002".to_string())),
                ("Light Chain".to_string(), Some("LC002".to_string())),
            ]
        );

        let heavy = &transport.calls_to(Method::Post, "aa-sequences:bulk-create")[0];
        let first = &heavy.body.as_ref().unwrap()["aaSequences"][0];
        assert_eq!(first["name"], "Heavy Chain for AB-1");
        assert_eq!(first["namingStrategy"], "NEW_IDS");
        assert_eq!(first["registryId"], "src_1");

        let composite = &transport.calls_to(Method::Post, "custom-entities:bulk-create")[0];
        let fields = &composite.body.as_ref().unwrap()["customEntities"][0]["fields"];
        assert_eq!(fields["Heavy Chain"]["value"], "HC001");
        assert_eq!(fields["Light Chain"]["value"], "LC001");
    }

    #[tokio::test]
    async fn test_failed_component_task_stops_the_run() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_post("aa-sequences:bulk-create", json!({"taskId": "t_heavy"}))
            .on_get(
                "tasks/t_heavy",
                json!({"status": "FAILED", "message": "invalid", "errors": [{"index": 1}]}),
            );

        let err = registration(&transport).run(&records()).await.unwrap_err();

        assert!(matches!(err, RegistrarError::TaskFailed { .. }));
        assert_eq!(transport.count(Method::Post, "aa-sequences:bulk-create"), 1);
        assert_eq!(transport.count(Method::Post, "custom-entities:bulk-create"), 0);
    }

    #[tokio::test]
    async fn test_short_task_response_is_a_mismatch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_post("aa-sequences:bulk-create", json!({"taskId": "t_heavy"}))
            .on_get(
                "tasks/t_heavy",
                json!({"status": "SUCCEEDED", "response": {"aaSequences": [
                    {"id": "HC_1", "entityRegistryId": "HC001"}
                ]}}),
            );

        let err = registration(&transport).run(&records()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::ResponseMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(transport.count(Method::Post, "custom-entities:bulk-create"), 0);
    }

    #[tokio::test]
    async fn test_no_records_makes_no_calls() {
        let transport = Arc::new(ScriptedTransport::new());
        let summary = registration(&transport).run(&[]).await.unwrap();
        assert_eq!(summary.total_records, 0);
        assert!(transport.calls().is_empty());
    }
}
