// Registrar - Resilient client for rate-limited registry APIs
// Copyright (c) 2025 Registrar Contributors
// Licensed under the MIT License

//! # Registrar - Resilient registry sync
//!
//! Registrar drives a rate-limited, REST-style scientific registry API
//! (entities, sequences, blobs and asynchronous tasks) from the command line
//! or from other Rust code.
//!
//! ## Overview
//!
//! This library provides:
//! - **Retrying** rate-limited calls with exponential backoff
//! - **Uploading** blobs, in parts when they exceed the chunk size, with the
//!   session aborted on the server whenever a step fails
//! - **Waiting** on asynchronous tasks until they succeed or fail
//! - **Reconciling** records against the registry before creating them
//! - **Exporting** registered records modified since a watermark
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Backoff, uploads, task polling, reconciliation and sync
//! - [`adapters`] - The registry transport and client
//! - [`domain`] - Identifiers, remote resources and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use registrar::adapters::registry::RegistryClient;
//! use registrar::config::load_config;
//! use registrar::core::cancel::CancelToken;
//! use registrar::core::upload::BlobUploader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("registrar.toml")?;
//!     let client = RegistryClient::from_config(&config.registry, CancelToken::none())?;
//!
//!     let uploader = BlobUploader::new(client, &config.upload);
//!     let blob = uploader.upload_file("plate_reader.csv", None).await?;
//!
//!     println!("Uploaded {}", blob.id().unwrap_or("-"));
//!     Ok(())
//! }
//! ```
//!
//! ## Rate Limits
//!
//! Every request goes through [`core::backoff::BackoffPolicy`]. A 429 is
//! retried after `base * 2^n` seconds; any other failure reaches the caller
//! immediately:
//!
//! ```rust
//! use registrar::core::backoff::BackoffPolicy;
//! use std::time::Duration;
//!
//! let policy = BackoffPolicy::new(Duration::from_secs(5), Some(3));
//! assert_eq!(policy.delay_for(0), Duration::from_secs(5));
//! assert_eq!(policy.delay_for(2), Duration::from_secs(20));
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::RegistrarError`]; the binary maps it to an
//! exit code:
//!
//! - `0` success
//! - `1` some records failed
//! - `2` configuration error
//! - `3` cancelled or deadline exceeded
//! - `5` fatal error

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
