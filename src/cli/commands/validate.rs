//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Registrar configuration file.

use super::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, RegistrarConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates before returning
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        Self::print_summary(&config);
        Ok(EXIT_SUCCESS)
    }

    fn print_summary(config: &RegistrarConfig) {
        let unset = "<not set>";

        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Registry: {}", config.registry.base_url);
        println!("  Auth: {:?}", config.registry.auth_type);
        println!(
            "  Retry: base delay {}s, {}",
            config.registry.retry.base_delay_secs,
            config
                .registry
                .retry
                .max_retries
                .map(|n| format!("at most {n} retries"))
                .unwrap_or_else(|| "unbounded retries".to_string())
        );
        println!("  Chunk Size: {} bytes", config.upload.chunk_size_bytes);
        println!("  Blob Type: {}", config.upload.blob_type);
        println!("  Task Poll Interval: {}s", config.tasks.poll_interval_secs);
        if let Some(max_wait) = config.tasks.max_wait_secs {
            println!("  Task Max Wait: {max_wait}s");
        }
        println!(
            "  Folder: {}",
            config.sync.folder_id.as_deref().unwrap_or(unset)
        );
        println!(
            "  Target Registry: {}",
            config.sync.registry_id.as_deref().unwrap_or(unset)
        );
        println!(
            "  Composite Schema: {}",
            config.sync.composite_schema_id.as_deref().unwrap_or(unset)
        );
        println!(
            "  Component Schema: {}",
            config.sync.component_schema_id.as_deref().unwrap_or(unset)
        );
        println!("  Component Fields: {:?}", config.sync.component_fields);
        println!();
    }
}
