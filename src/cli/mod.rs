//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Registrar using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Registrar - resilient client for a rate-limited registry API
#[derive(Parser, Debug)]
#[command(name = "registrar")]
#[command(version, about, long_about = None)]
#[command(author = "Registrar Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "registrar.toml", env = "REGISTRAR_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "REGISTRAR_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload a file as a blob, in parts when it exceeds the chunk size
    UploadBlob(commands::upload::UploadArgs),

    /// Register records through asynchronous bulk-create tasks
    BulkCreate(commands::bulk_create::BulkCreateArgs),

    /// Register records one at a time, reusing existing components
    Sync(commands::sync::SyncArgs),

    /// Create an assay run and upload results against it
    UploadResults(commands::upload_results::UploadResultsArgs),

    /// Export registered records as JSON Lines
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
