//! Assay result upload
//!
//! Creates one assay run, then posts every result in a single
//! `assay-results` call with its run field pointing at the new run. The
//! input is a JSON document:
//!
//! ```json
//! {
//!   "run": {"instrument": "PR-01"},
//!   "results": [{"sample": "S1", "well": "A1", "signal": 0.53}]
//! }
//! ```
//!
//! `run` is optional and holds the run's fields; each result object holds
//! one result's fields.

use crate::adapters::registry::RegistryClient;
use crate::config::ResultsConfig;
use crate::core::reconcile::pair_by_position;
use crate::domain::{RegistrarError, RemoteError, Result, SchemaId};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::{Duration, Instant};

/// Parsed results document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultBatch {
    /// Fields of the run the results belong to
    pub run_fields: Map<String, Value>,
    /// Fields of each result, in input order
    pub results: Vec<Map<String, Value>>,
}

/// Parse a results document
///
/// # Errors
///
/// `Validation` when the results array is missing or empty, an entry is not
/// an object, or an entry already sets the run field.
pub fn parse_results(contents: &str, config: &ResultsConfig) -> Result<ResultBatch> {
    let doc: Value = serde_json::from_str(contents)?;

    let run_fields = match doc.get("run") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(fields)) => fields.clone(),
        Some(other) => {
            return Err(RegistrarError::Validation(format!(
                "'run' must be an object, got {other}"
            )))
        }
    };

    let items = doc
        .get(&config.results_key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RegistrarError::Validation(format!("input has no '{}' array", config.results_key))
        })?;

    if items.is_empty() {
        return Err(RegistrarError::Validation(format!(
            "'{}' is empty, nothing to upload",
            config.results_key
        )));
    }

    let results = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let fields = item.as_object().ok_or_else(|| {
                RegistrarError::Validation(format!("result {index} is not an object"))
            })?;
            if fields.contains_key(&config.run_field) {
                return Err(RegistrarError::Validation(format!(
                    "result {index} sets '{}', which is filled in from the created run",
                    config.run_field
                )));
            }
            Ok(fields.clone())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ResultBatch {
        run_fields,
        results,
    })
}

/// Read and parse a results file
pub async fn load_results(path: impl AsRef<Path>, config: &ResultsConfig) -> Result<ResultBatch> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        RegistrarError::Io(format!("Failed to read {}: {e}", path.display()))
    })?;
    let batch = parse_results(&contents, config)?;
    tracing::info!(path = %path.display(), results = batch.results.len(), "Loaded assay results");
    Ok(batch)
}

/// Schemas the run and its results are created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTargets {
    pub run_schema_id: SchemaId,
    pub result_schema_id: SchemaId,
}

impl ResultTargets {
    /// Resolve schemas from the `[results]` section
    ///
    /// # Errors
    ///
    /// `Configuration` naming every missing identifier.
    pub fn from_config(config: &ResultsConfig) -> Result<Self> {
        let run = trimmed(&config.run_schema_id);
        let result = trimmed(&config.result_schema_id);

        let missing: Vec<&str> = [("run_schema_id", &run), ("result_schema_id", &result)]
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();
        if !missing.is_empty() {
            return Err(RegistrarError::Configuration(format!(
                "missing results settings: {}",
                missing.join(", ")
            )));
        }

        Ok(Self {
            run_schema_id: SchemaId::new(run.unwrap_or_default())
                .map_err(RegistrarError::Configuration)?,
            result_schema_id: SchemaId::new(result.unwrap_or_default())
                .map_err(RegistrarError::Configuration)?,
        })
    }
}

/// Outcome of a result upload
#[derive(Debug, Clone, PartialEq)]
pub struct ResultUploadReport {
    pub run_id: String,
    pub result_ids: Vec<String>,
    pub duration: Duration,
}

/// Creates a run and uploads its results
#[derive(Debug, Clone)]
pub struct AssayResultUpload {
    client: RegistryClient,
    targets: ResultTargets,
    run_field: String,
}

impl AssayResultUpload {
    pub fn new(client: RegistryClient, targets: ResultTargets, config: &ResultsConfig) -> Self {
        Self {
            client,
            targets,
            run_field: config.run_field.clone(),
        }
    }

    /// Create the run, then post every result linked to it
    ///
    /// # Errors
    ///
    /// Transport errors from either call, `InvalidResponse` when the run
    /// response does not hold exactly one id, and `ResponseMismatch` when
    /// the server acknowledges a different number of results. No results
    /// are posted if the run could not be created.
    pub async fn run(&self, batch: &ResultBatch) -> Result<ResultUploadReport> {
        let started = Instant::now();

        let run_id = self.create_run(&batch.run_fields).await?;
        tracing::info!(run_id = %run_id, results = batch.results.len(), "Created assay run");

        let items: Vec<Value> = batch
            .results
            .iter()
            .map(|fields| {
                let mut fields = fields.clone();
                fields.insert(self.run_field.clone(), Value::String(run_id.clone()));
                json!({
                    "schemaId": self.targets.result_schema_id,
                    "fields": fields,
                })
            })
            .collect();

        let body = self
            .client
            .post("assay-results", &json!({ "assayResults": items }))
            .await?;
        let result_ids = ids_under(&body, "assayResults")?;
        pair_by_position("assay-results", batch.results.clone(), result_ids.clone())?;

        tracing::info!(run_id = %run_id, results = result_ids.len(), "Uploaded assay results");

        Ok(ResultUploadReport {
            run_id,
            result_ids,
            duration: started.elapsed(),
        })
    }

    async fn create_run(&self, fields: &Map<String, Value>) -> Result<String> {
        let body = self
            .client
            .post(
                "assay-runs",
                &json!({"assayRuns": [{"schemaId": self.targets.run_schema_id, "fields": fields}]}),
            )
            .await?;

        let mut ids = ids_under(&body, "assayRuns")?;
        match ids.len() {
            1 => Ok(ids.remove(0)),
            n => Err(RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "expected one assay run id, got {n}"
            )))),
        }
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Ids listed under `key`, given either as strings or as objects with an `id`
fn ids_under(body: &Value, key: &str) -> Result<Vec<String>> {
    let items = body.get(key).and_then(Value::as_array).ok_or_else(|| {
        RegistrarError::Remote(RemoteError::InvalidResponse(format!(
            "response has no '{key}' array"
        )))
    })?;

    items
        .iter()
        .map(|item| {
            item.as_str()
                .or_else(|| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .ok_or_else(|| {
                    RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                        "'{key}' entry has no id: {item}"
                    )))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::scripted::{Method, Reply, ScriptedTransport};
    use crate::core::backoff::BackoffPolicy;
    use crate::core::cancel::CancelToken;
    use std::sync::Arc;

    const PLATE: &str = r#"{
        "run": {"instrument": "PR-01"},
        "results": [
            {"sample": "S1", "well": "A1", "signal": 0.53},
            {"sample": "S2", "well": "A2", "signal": 0.61}
        ]
    }"#;

    fn targets() -> ResultTargets {
        ResultTargets {
            run_schema_id: SchemaId::new("assaysch_run").unwrap(),
            result_schema_id: SchemaId::new("assaysch_result").unwrap(),
        }
    }

    fn upload(transport: &Arc<ScriptedTransport>) -> AssayResultUpload {
        let client = RegistryClient::new(
            transport.clone(),
            BackoffPolicy::default(),
            CancelToken::none(),
        );
        AssayResultUpload::new(client, targets(), &ResultsConfig::default())
    }

    fn batch() -> ResultBatch {
        parse_results(PLATE, &ResultsConfig::default()).unwrap()
    }

    #[test]
    fn test_parse_results() {
        let batch = batch();
        assert_eq!(batch.run_fields["instrument"], "PR-01");
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.results[1]["well"], "A2");
    }

    #[test]
    fn test_parse_rejects_bad_documents() {
        let config = ResultsConfig::default();

        let err = parse_results(r#"{"rows": []}"#, &config).unwrap_err();
        assert!(err.to_string().contains("'results'"));

        assert!(parse_results(r#"{"results": []}"#, &config).is_err());
        assert!(parse_results(r#"{"results": [1]}"#, &config).is_err());

        let err = parse_results(r#"{"results": [{"run": "x"}]}"#, &config).unwrap_err();
        assert!(err.to_string().contains("'run'"));
    }

    #[test]
    fn test_targets_report_every_missing_schema() {
        let err = ResultTargets::from_config(&ResultsConfig::default())
            .unwrap_err()
            .to_string();
        assert!(err.contains("run_schema_id"));
        assert!(err.contains("result_schema_id"));

        let config = ResultsConfig {
            run_schema_id: Some("assaysch_run".to_string()),
            result_schema_id: Some("assaysch_result".to_string()),
            ..Default::default()
        };
        assert_eq!(ResultTargets::from_config(&config).unwrap(), targets());
    }

    #[tokio::test]
    async fn test_results_carry_the_created_run_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_post("assay-runs", json!({"assayRuns": ["run_42"]}))
            .on_post("assay-results", json!({"assayResults": ["res_1", "res_2"]}));

        let report = upload(&transport).run(&batch()).await.unwrap();

        assert_eq!(report.run_id, "run_42");
        assert_eq!(report.result_ids, vec!["res_1", "res_2"]);

        let run_call = &transport.calls_to(Method::Post, "assay-runs")[0];
        assert_eq!(
            run_call.body,
            Some(json!({"assayRuns": [
                {"schemaId": "assaysch_run", "fields": {"instrument": "PR-01"}}
            ]}))
        );

        let results_call = &transport.calls_to(Method::Post, "assay-results")[0];
        let posted = results_call.body.as_ref().unwrap()["assayResults"]
            .as_array()
            .unwrap()
            .clone();
        assert_eq!(posted.len(), 2);
        for result in &posted {
            assert_eq!(result["schemaId"], "assaysch_result");
            assert_eq!(result["fields"]["run"], "run_42");
        }
        assert_eq!(posted[0]["fields"]["sample"], "S1");
    }

    #[tokio::test]
    async fn test_failed_run_posts_no_results() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .reply(
                Method::Post,
                "assay-runs",
                Reply::Status(400, json!({"error": {"message": "Unknown schema"}})),
            )
            .on_post("assay-results", json!({"assayResults": []}));

        let err = upload(&transport).run(&batch()).await.unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(transport.count(Method::Post, "assay-results"), 0);
    }

    #[tokio::test]
    async fn test_run_response_must_hold_one_id() {
        for body in [json!({"assayRuns": []}), json!({"assayRuns": ["r1", "r2"]}), json!({})] {
            let transport = Arc::new(ScriptedTransport::new());
            transport.on_post("assay-runs", body.clone());

            let err = upload(&transport).run(&batch()).await.unwrap_err();

            assert!(
                matches!(err, RegistrarError::Remote(RemoteError::InvalidResponse(_))),
                "{body}: {err:?}"
            );
            assert_eq!(transport.count(Method::Post, "assay-results"), 0);
        }
    }

    #[tokio::test]
    async fn test_result_count_mismatch() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .on_post("assay-runs", json!({"assayRuns": [{"id": "run_1"}]}))
            .on_post("assay-results", json!({"assayResults": ["res_1"]}));

        let err = upload(&transport).run(&batch()).await.unwrap_err();

        assert!(matches!(
            err,
            RegistrarError::ResponseMismatch { expected: 2, actual: 1, .. }
        ));
    }
}
