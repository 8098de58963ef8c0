//! Find-or-create against a uniqueness key
//!
//! Before creating a dependent record the engine asks the registry for
//! registered records matching a key (for sequences: schema plus residues).
//! Exactly one match is reused as-is. More than one is a conflict that needs
//! a human. None means the record is created.
//!
//! There is no lock between the lookup and the create; two concurrent runs
//! can both see zero matches and both create.

use crate::adapters::registry::{Query, RegistryClient};
use crate::domain::{resources_under, RegistrarError, RemoteResource, Result};
use serde_json::Value;

/// Lookup describing what must be unique
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessQuery {
    /// Collection path, used for both the lookup and the create
    pub collection: String,
    /// Key of the result array in the list response
    pub list_key: String,
    /// Filter parameters forming the key
    pub params: Vec<(String, String)>,
}

impl UniquenessQuery {
    pub fn new(collection: impl Into<String>, list_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            list_key: list_key.into(),
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Human-readable key for logs and conflict errors
    pub fn describe(&self) -> String {
        let pairs: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{}?{}", self.collection, pairs.join("&"))
    }

    fn as_query(&self) -> &Query {
        &self.params
    }
}

/// A resolved dependent record
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub resource: RemoteResource,
    /// True when this call created the record
    pub created: bool,
}

/// Deduplicates dependent records before they are created
#[derive(Debug, Clone)]
pub struct ReconciliationEngine {
    client: RegistryClient,
    registry_field: String,
}

impl ReconciliationEngine {
    /// `registry_field` names the field that is non-null on registered records
    pub fn new(client: RegistryClient, registry_field: impl Into<String>) -> Self {
        Self {
            client,
            registry_field: registry_field.into(),
        }
    }

    /// Registered records matching `query`
    pub async fn find_registered(&self, query: &UniquenessQuery) -> Result<Vec<RemoteResource>> {
        let body = self
            .client
            .get(&query.collection, query.as_query())
            .await?;
        let matches = resources_under(&body, &query.list_key)?
            .into_iter()
            .filter(|r| r.registry_identity_in(&self.registry_field).is_some())
            .collect();
        Ok(matches)
    }

    /// Reuse the single registered match, or create `payload`
    ///
    /// # Errors
    ///
    /// `ReconciliationConflict` (and no write) when more than one registered
    /// record matches; transport errors from the lookup or the create.
    pub async fn find_or_create(
        &self,
        query: &UniquenessQuery,
        payload: &Value,
    ) -> Result<Reconciled> {
        let mut matches = self.find_registered(query).await?;

        match matches.len() {
            0 => {
                let resource = self
                    .client
                    .post_resource(&query.collection, payload)
                    .await?;
                tracing::info!(key = %query.describe(), id = ?resource.id(), "No registered match, created");
                Ok(Reconciled {
                    resource,
                    created: true,
                })
            }
            1 => {
                let resource = matches.remove(0);
                tracing::info!(
                    key = %query.describe(),
                    id = ?resource.id(),
                    registry_id = ?resource.registry_identity_in(&self.registry_field),
                    "Reusing registered record"
                );
                Ok(Reconciled {
                    resource,
                    created: false,
                })
            }
            n => {
                tracing::warn!(key = %query.describe(), matches = n, "Ambiguous reconciliation key");
                Err(RegistrarError::ReconciliationConflict {
                    key: query.describe(),
                    matches: n,
                })
            }
        }
    }
}

/// Zip bulk inputs with the outputs the server returned for them
///
/// Bulk endpoints answer in request order without echoing a key, so pairing
/// is positional. Lengths must agree.
pub fn pair_by_position<I, O>(context: &str, inputs: Vec<I>, outputs: Vec<O>) -> Result<Vec<(I, O)>> {
    if inputs.len() != outputs.len() {
        return Err(RegistrarError::ResponseMismatch {
            context: context.to_string(),
            expected: inputs.len(),
            actual: outputs.len(),
        });
    }
    Ok(inputs.into_iter().zip(outputs).collect())
}
