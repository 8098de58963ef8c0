//! Configuration management for Registrar.
//!
//! Registrar uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `REGISTRAR_<SECTION>_<KEY>` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use registrar::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("registrar.toml")?;
//! println!("Registry: {}", config.registry.base_url);
//! println!("Chunk size: {}", config.upload.chunk_size_bytes);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [registry]
//! base_url = "https://example.benchling.com/api/v2"
//! api_key = "${REGISTRAR_API_KEY}"
//!
//! [registry.retry]
//! base_delay_secs = 5
//!
//! [upload]
//! chunk_size_bytes = 10000000
//!
//! [tasks]
//! poll_interval_secs = 10
//!
//! [sync]
//! folder_id = "lib_abc123"
//! registry_id = "src_def456"
//! composite_schema_id = "ts_antibody"
//! component_schema_id = "ts_chain"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    ApplicationConfig, AuthType, LoggingConfig, RegistrarConfig, RegistryConfig, ResultsConfig,
    RetryConfig, SyncConfig, TaskConfig, UploadConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
