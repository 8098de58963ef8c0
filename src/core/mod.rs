//! Core orchestration for Registrar.
//!
//! # Modules
//!
//! - [`cancel`] - shutdown signal and deadlines consulted at every suspension point
//! - [`backoff`] - doubling backoff for rate-limited calls
//! - [`upload`] - single-part and chunked multipart blob uploads
//! - [`task`] - polling of asynchronous tasks and blob upload status
//! - [`reconcile`] - find-or-create deduplication of dependent records
//! - [`sync`] - bulk registration, per-record sync and incremental export
//!
//! # Example
//!
//! ```rust,no_run
//! use registrar::adapters::registry::RegistryClient;
//! use registrar::config::load_config;
//! use registrar::core::cancel::CancelToken;
//! use registrar::core::sync::{load_records, RecordSync, SyncTargets};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("registrar.toml")?;
//!
//! // Shutdown signal, flipped to true on Ctrl+C
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//! let client = RegistryClient::from_config(&config.registry, CancelToken::from_signal(shutdown_rx))?;
//!
//! let targets = SyncTargets::from_config(&config.sync)?;
//! let records = load_records("antibodies.json", &config.sync).await?;
//! let summary = RecordSync::new(client, targets, &config.sync).run(&records).await?;
//!
//! println!("Registered: {}", summary.succeeded);
//! println!("Failed: {}", summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod backoff;
pub mod cancel;
pub mod reconcile;
pub mod sync;
pub mod task;
pub mod upload;
