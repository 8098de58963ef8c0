//! Bulk create command implementation
//!
//! Registers every record in an input file through bulk-create tasks: one
//! task per component field, then one for the composite records.

use super::{connect, load_or_report, print_summary, report_error, TargetArgs, EXIT_CONFIG};
use crate::core::sync::{load_records, BulkRegistration, SyncTargets};
use crate::core::task::TaskPoller;
use crate::log_operation_start;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the bulk-create command
#[derive(Args, Debug)]
pub struct BulkCreateArgs {
    /// JSON file holding the records to register
    pub records: PathBuf,

    #[command(flatten)]
    pub targets: TargetArgs,
}

impl BulkCreateArgs {
    /// Execute the bulk-create command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        log_operation_start!("bulk-create", self.records.display());

        let mut config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };
        self.targets.apply(&mut config.sync);

        let targets = match SyncTargets::from_config(&config.sync) {
            Ok(targets) => targets,
            Err(e) => {
                println!("❌ {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let records = match load_records(&self.records, &config.sync).await {
            Ok(records) => records,
            Err(e) => return Ok(report_error(&e, "Failed to read records")),
        };

        let client = match connect(&config, shutdown_signal) {
            Ok(client) => client,
            Err(e) => return Ok(report_error(&e, "Failed to create registry client")),
        };

        println!(
            "📦 Bulk registering {} record(s) into {}",
            records.len(),
            targets.registry_id
        );

        let poller = TaskPoller::from_config(client.clone(), &config.tasks);
        let registration = BulkRegistration::new(client, poller, targets, &config.sync);

        match registration.run(&records).await {
            Ok(summary) => Ok(print_summary(&summary)),
            Err(e) => Ok(report_error(&e, "Bulk registration failed")),
        }
    }
}
