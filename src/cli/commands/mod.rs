//! CLI command implementations
//!
//! This module contains all CLI command implementations and the pieces they
//! share: loading configuration, target overrides and exit codes.
//!
//! Exit codes:
//! - `0` everything succeeded
//! - `1` the run finished but some records failed
//! - `2` configuration error
//! - `3` cancelled or deadline exceeded
//! - `5` fatal error

pub mod bulk_create;
pub mod export;
pub mod init;
pub mod sync;
pub mod upload;
pub mod upload_results;
pub mod validate;

use crate::adapters::registry::RegistryClient;
use crate::config::{load_config, RegistrarConfig, SyncConfig};
use crate::core::cancel::CancelToken;
use crate::core::sync::SyncSummary;
use crate::domain::RegistrarError;
use crate::log_error_with_context;
use clap::Args;
use tokio::sync::watch;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_PARTIAL: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;
pub const EXIT_INTERRUPTED: i32 = 3;
pub const EXIT_FATAL: i32 = 5;

/// Sync identifiers that override the `[sync]` section
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Folder new entities are created in
    #[arg(long)]
    pub folder_id: Option<String>,

    /// Registry entities are registered into
    #[arg(long)]
    pub registry_id: Option<String>,

    /// Schema of the composite record
    #[arg(long)]
    pub composite_schema_id: Option<String>,

    /// Schema of the component sequences
    #[arg(long)]
    pub component_schema_id: Option<String>,
}

impl TargetArgs {
    /// Apply the given identifiers on top of `config`
    pub fn apply(&self, config: &mut SyncConfig) {
        if let Some(ref id) = self.folder_id {
            config.folder_id = Some(id.clone());
        }
        if let Some(ref id) = self.registry_id {
            config.registry_id = Some(id.clone());
        }
        if let Some(ref id) = self.composite_schema_id {
            config.composite_schema_id = Some(id.clone());
        }
        if let Some(ref id) = self.component_schema_id {
            config.component_schema_id = Some(id.clone());
        }
    }
}

/// Load the configuration, printing the failure
pub(crate) fn load_or_report(config_path: &str) -> Result<RegistrarConfig, i32> {
    load_config(config_path).map_err(|e| {
        log_error_with_context!(e, "Failed to load configuration");
        eprintln!("❌ Failed to load configuration: {e}");
        EXIT_CONFIG
    })
}

/// Client cancelled by the shutdown signal
pub(crate) fn connect(
    config: &RegistrarConfig,
    shutdown_signal: watch::Receiver<bool>,
) -> Result<RegistryClient, RegistrarError> {
    RegistryClient::from_config(&config.registry, CancelToken::from_signal(shutdown_signal))
}

/// Exit code for an error that ended a command
pub fn exit_code_for(error: &RegistrarError) -> i32 {
    match error {
        RegistrarError::Configuration(_) => EXIT_CONFIG,
        e if e.is_interruption() => EXIT_INTERRUPTED,
        _ => EXIT_FATAL,
    }
}

/// Print and log an error that ended a command, returning its exit code
pub(crate) fn report_error(error: &RegistrarError, context: &str) -> i32 {
    log_error_with_context!(error, context);
    let code = exit_code_for(error);
    if code == EXIT_INTERRUPTED {
        eprintln!("⚠️  {context}: {error}");
    } else {
        eprintln!("❌ {context}: {error}");
    }
    code
}

/// Print a sync summary and map it to an exit code
pub(crate) fn print_summary(summary: &SyncSummary) -> i32 {
    summary.log_summary();

    println!();
    println!("📊 Registration Summary");
    println!("   Records: {}", summary.total_records);
    println!("   Registered: {}", summary.succeeded);
    println!("   Failed: {}", summary.failed);
    println!("   Components created: {}", summary.components_created);
    println!("   Components reused: {}", summary.components_reused);
    println!("   Success rate: {:.1}%", summary.success_rate());
    println!("   Duration: {:.2}s", summary.duration.as_secs_f64());

    if !summary.registered.is_empty() {
        println!();
        for record in &summary.registered {
            let components = record
                .components
                .iter()
                .map(|(field, id)| format!("{field}={}", id.as_deref().unwrap_or("-")))
                .collect::<Vec<_>>()
                .join(", ");
            println!(
                "   {} -> {} ({components})",
                record.name,
                record.registry_id.as_deref().unwrap_or("-")
            );
        }
    }

    if !summary.errors.is_empty() {
        println!();
        println!("⚠️  Errors ({}):", summary.errors.len());
        for error in &summary.errors {
            println!(
                "   - {}: {}",
                error.record.as_deref().unwrap_or("<run>"),
                error.message
            );
        }
    }
    println!();

    if summary.is_successful() {
        println!("✅ All records registered");
        EXIT_SUCCESS
    } else {
        println!("⚠️  Completed with failures");
        EXIT_PARTIAL
    }
}
