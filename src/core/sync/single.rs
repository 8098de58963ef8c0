//! Per-record sync with deduplicated components
//!
//! For each record: find or create every component sequence, create the
//! composite referencing them, register the composite together with any
//! component that is not registered yet, then read everything back to report
//! the assigned registry identities. A registration rejected with 400 fails
//! only that record; the run moves on to the next one.

use super::records::{SourceRecord, SyncTargets};
use super::summary::{RegisteredRecord, SyncError, SyncSummary};
use crate::adapters::registry::models::RegisterEntitiesRequest;
use crate::adapters::registry::{query, RegistryClient};
use crate::config::SyncConfig;
use crate::core::reconcile::{pair_by_position, Reconciled, ReconciliationEngine, UniquenessQuery};
use crate::domain::{resources_under, RegistrarError, RemoteResource, Result};
use serde_json::{json, Map};
use std::time::Instant;

/// Outcome of one record
#[derive(Debug)]
enum RecordOutcome {
    Registered(RegisteredRecord),
    Rejected(RegistrarError),
}

/// Sequential per-record registration
#[derive(Debug, Clone)]
pub struct RecordSync {
    client: RegistryClient,
    engine: ReconciliationEngine,
    targets: SyncTargets,
    component_fields: Vec<String>,
    naming_strategy: String,
    registry_field: String,
}

impl RecordSync {
    pub fn new(client: RegistryClient, targets: SyncTargets, config: &SyncConfig) -> Self {
        Self {
            engine: ReconciliationEngine::new(client.clone(), config.registry_field.clone()),
            client,
            targets,
            component_fields: config.component_fields.clone(),
            naming_strategy: config.naming_strategy.clone(),
            registry_field: config.registry_field.clone(),
        }
    }

    /// Sync every record in order
    ///
    /// # Errors
    ///
    /// Anything other than a rejected registration stops the run, including
    /// reconciliation conflicts and cancellation.
    pub async fn run(&self, records: &[SourceRecord]) -> Result<SyncSummary> {
        let started = Instant::now();
        let mut summary = SyncSummary::new(records.len());

        for record in records {
            match self.sync_record(record, &mut summary).await? {
                RecordOutcome::Registered(registered) => {
                    tracing::info!(
                        name = %registered.name,
                        registry_id = ?registered.registry_id,
                        "Registered record"
                    );
                    summary.add_registered(registered);
                }
                RecordOutcome::Rejected(err) => {
                    tracing::warn!(name = %record.name, error = %err, "Could not register record");
                    summary.add_failure(SyncError::from_error(&err).with_record(&record.name));
                }
            }
        }

        Ok(summary.with_duration(started.elapsed()))
    }

    async fn sync_record(
        &self,
        record: &SourceRecord,
        summary: &mut SyncSummary,
    ) -> Result<RecordOutcome> {
        let mut components = Vec::with_capacity(self.component_fields.len());
        for field in &self.component_fields {
            let reconciled = self.resolve_component(record, field).await?;
            if reconciled.created {
                summary.components_created += 1;
            } else {
                summary.components_reused += 1;
            }
            components.push((field.clone(), reconciled.resource));
        }

        let composite = self.create_composite(record, &components).await?;
        let composite_id = composite.require_id("custom entity")?.to_string();

        let mut entity_ids = vec![composite_id.clone()];
        for (_, component) in &components {
            if component.registry_identity_in(&self.registry_field).is_none() {
                entity_ids.push(component.require_id("aa sequence")?.to_string());
            }
        }

        match self.register(entity_ids).await {
            Ok(()) => {}
            Err(err) if err.status() == Some(400) => return Ok(RecordOutcome::Rejected(err)),
            Err(err) => return Err(err),
        }

        let registered = self
            .client
            .get_resource(&format!("custom-entities/{composite_id}"))
            .await?;
        let refreshed = self.refresh_components(&components).await?;

        Ok(RecordOutcome::Registered(RegisteredRecord {
            name: record.name.clone(),
            registry_id: registered
                .registry_identity_in(&self.registry_field)
                .map(str::to_string),
            components: components
                .iter()
                .zip(&refreshed)
                .map(|((field, _), resource)| {
                    (
                        field.clone(),
                        resource
                            .registry_identity_in(&self.registry_field)
                            .map(str::to_string),
                    )
                })
                .collect(),
        }))
    }

    async fn resolve_component(&self, record: &SourceRecord, field: &str) -> Result<Reconciled> {
        let residues = record.component(field).ok_or_else(|| {
            RegistrarError::Validation(format!("record '{}' has no '{field}'", record.name))
        })?;

        let lookup = UniquenessQuery::new("aa-sequences", "aaSequences")
            .param("schemaId", self.targets.component_schema_id.as_str())
            .param("aminoAcids", residues);

        let payload = json!({
            "aminoAcids": residues,
            "folderId": self.targets.folder_id,
            "name": record.component_name(field),
            "schemaId": self.targets.component_schema_id,
        });

        self.engine.find_or_create(&lookup, &payload).await
    }

    async fn create_composite(
        &self,
        record: &SourceRecord,
        components: &[(String, RemoteResource)],
    ) -> Result<RemoteResource> {
        let mut fields = Map::new();
        for (field, component) in components {
            let id = component.require_id("aa sequence")?;
            fields.insert(field.clone(), json!({ "value": id }));
        }

        let body = json!({
            "name": record.name,
            "schemaId": self.targets.composite_schema_id,
            "folderId": self.targets.folder_id,
            "fields": fields,
        });

        let composite = self.client.post_resource("custom-entities", &body).await?;
        tracing::debug!(name = %record.name, id = ?composite.id(), "Created composite record");
        Ok(composite)
    }

    async fn register(&self, entity_ids: Vec<String>) -> Result<()> {
        let path = format!("registries/{}:register-entities", self.targets.registry_id);
        let request = RegisterEntitiesRequest {
            entity_ids,
            naming_strategy: self.naming_strategy.clone(),
        };
        tracing::debug!(entities = ?request.entity_ids, "Registering entities");
        self.client.post_json(&path, &request).await?;
        Ok(())
    }

    async fn refresh_components(
        &self,
        components: &[(String, RemoteResource)],
    ) -> Result<Vec<RemoteResource>> {
        let ids = components
            .iter()
            .map(|(_, c)| c.require_id("aa sequence"))
            .collect::<Result<Vec<_>>>()?
            .join(",");

        let body = self
            .client
            .get("aa-sequences:bulk-get", &query(&[("aaSequenceIds", ids.as_str())]))
            .await?;
        let refreshed = resources_under(&body, "aaSequences")?;

        // bulk-get answers in request order
        let pairs = pair_by_position("aa-sequences bulk get", components.to_vec(), refreshed)?;
        Ok(pairs.into_iter().map(|(_, r)| r).collect())
    }
}
