//! Upload results command implementation
//!
//! Creates an assay run and uploads the results in an input file against it.

use super::{connect, load_or_report, report_error, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::ResultsConfig;
use crate::core::sync::{load_results, AssayResultUpload, ResultTargets};
use crate::log_operation_start;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the upload-results command
#[derive(Args, Debug)]
pub struct UploadResultsArgs {
    /// JSON file holding the run fields and results
    pub results: PathBuf,

    /// Schema of the created run (overrides results.run_schema_id)
    #[arg(long)]
    pub run_schema_id: Option<String>,

    /// Schema of the uploaded results (overrides results.result_schema_id)
    #[arg(long)]
    pub result_schema_id: Option<String>,
}

impl UploadResultsArgs {
    /// Execute the upload-results command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        log_operation_start!("upload-results", self.results.display());

        let mut config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        self.apply(&mut config.results);

        let targets = match ResultTargets::from_config(&config.results) {
            Ok(targets) => targets,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let batch = match load_results(&self.results, &config.results).await {
            Ok(batch) => batch,
            Err(e) => return Ok(report_error(&e, "Failed to read results")),
        };

        let client = match connect(&config, shutdown_signal) {
            Ok(client) => client,
            Err(e) => return Ok(report_error(&e, "Failed to create registry client")),
        };

        println!(
            "🧪 Uploading {} result(s) into a new {} run",
            batch.results.len(),
            targets.run_schema_id
        );

        let upload = AssayResultUpload::new(client, targets, &config.results);
        match upload.run(&batch).await {
            Ok(report) => {
                println!("✅ Results uploaded");
                println!("   Run ID: {}", report.run_id);
                println!("   Results: {}", report.result_ids.len());
                println!("   Duration: {:.2}s", report.duration.as_secs_f64());
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_error(&e, "Result upload failed")),
        }
    }

    fn apply(&self, config: &mut ResultsConfig) {
        if let Some(ref id) = self.run_schema_id {
            config.run_schema_id = Some(id.clone());
        }
        if let Some(ref id) = self.result_schema_id {
            config.result_schema_id = Some(id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> UploadResultsArgs {
        UploadResultsArgs {
            results: PathBuf::from("plate.json"),
            run_schema_id: Some("assaysch_cli".to_string()),
            result_schema_id: None,
        }
    }

    #[test]
    fn test_flags_override_configured_schemas() {
        let mut config = ResultsConfig {
            run_schema_id: Some("assaysch_file".to_string()),
            result_schema_id: Some("assaysch_result".to_string()),
            ..Default::default()
        };
        args().apply(&mut config);

        assert_eq!(config.run_schema_id.as_deref(), Some("assaysch_cli"));
        assert_eq!(config.result_schema_id.as_deref(), Some("assaysch_result"));
    }

    #[tokio::test]
    async fn test_missing_config_is_a_config_error() {
        let (_tx, rx) = watch::channel(false);
        let code = args()
            .execute("/nonexistent/registrar.toml", rx)
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
