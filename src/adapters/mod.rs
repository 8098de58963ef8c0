//! External system integrations for Registrar.
//!
//! - [`registry`] - registry API transport, client and wire models
//!
//! # Design Pattern
//!
//! Adapters isolate the HTTP stack behind the [`registry::Transport`] trait so
//! the orchestration layer can be exercised against an in-memory
//! implementation.
//!
//! ```rust,no_run
//! use registrar::adapters::registry::RegistryClient;
//! use registrar::config::load_config;
//! use registrar::core::cancel::CancelToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("registrar.toml")?;
//! let client = RegistryClient::from_config(&config.registry, CancelToken::none())?;
//! let blob = client.get_resource("blobs/0b1f2c3d").await?;
//! println!("{:?}", blob.name());
//! # Ok(())
//! # }
//! ```

pub mod registry;
