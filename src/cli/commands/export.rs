//! Export command implementation
//!
//! This module implements the `export` command: registered composite records
//! are written as JSON Lines to a file or stdout, optionally only those
//! modified after a watermark.

use super::{connect, load_or_report, report_error, EXIT_CONFIG, EXIT_SUCCESS};
use crate::core::sync::{parse_since, ExportReport, IncrementalExport};
use crate::domain::{RegistryId, Result, SchemaId};
use crate::log_operation_start;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Only export records modified after this RFC 3339 timestamp
    #[arg(long)]
    pub since: Option<String>,

    /// Registry to export from (overrides sync.registry_id)
    #[arg(long)]
    pub registry_id: Option<String>,

    /// Schema of the exported records (overrides sync.composite_schema_id)
    #[arg(long)]
    pub composite_schema_id: Option<String>,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        log_operation_start!("export", self.since.as_deref().unwrap_or("full"));

        let config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        let since = match self.since.as_deref().map(parse_since).transpose() {
            Ok(since) => since,
            Err(e) => {
                eprintln!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let (registry_id, schema_id) = match self.resolve_ids(
            config.sync.registry_id.as_deref(),
            config.sync.composite_schema_id.as_deref(),
        ) {
            Ok(ids) => ids,
            Err(message) => {
                eprintln!("❌ {message}");
                return Ok(EXIT_CONFIG);
            }
        };

        let client = match connect(&config, shutdown_signal) {
            Ok(client) => client,
            Err(e) => return Ok(report_error(&e, "Failed to create registry client")),
        };

        let export =
            IncrementalExport::new(client, registry_id, schema_id, &config.sync.registry_field);

        match self.write(&export, since).await {
            Ok(report) => {
                // stdout carries the rows when no output file is given
                eprintln!(
                    "✅ Exported {} record(s) from {} page(s) in {:.2}s",
                    report.rows,
                    report.pages,
                    report.duration.as_secs_f64()
                );
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_error(&e, "Export failed")),
        }
    }

    async fn write(
        &self,
        export: &IncrementalExport,
        since: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<ExportReport> {
        match &self.output {
            Some(path) => {
                let file = tokio::fs::File::create(path).await?;
                export.export(since, file).await
            }
            None => export.export(since, tokio::io::stdout()).await,
        }
    }

    fn resolve_ids(
        &self,
        configured_registry: Option<&str>,
        configured_schema: Option<&str>,
    ) -> std::result::Result<(RegistryId, SchemaId), String> {
        let registry = self
            .registry_id
            .as_deref()
            .or(configured_registry)
            .ok_or("a registry id is required (--registry-id or sync.registry_id)")?;
        let schema = self
            .composite_schema_id
            .as_deref()
            .or(configured_schema)
            .ok_or("a schema id is required (--composite-schema-id or sync.composite_schema_id)")?;

        Ok((RegistryId::new(registry)?, SchemaId::new(schema)?))
    }
}
