//! Domain models and types for Registrar.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`BlobId`], [`TaskId`], [`SchemaId`], ...)
//! - **Remote resources** ([`RemoteResource`]) as returned by the registry
//! - **Error types** ([`RegistrarError`], [`RemoteError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, RegistrarError>`]:
//!
//! ```rust
//! use registrar::domain::{RegistrarError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = registrar::config::load_config("registrar.toml")?;
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod resource;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{RegistrarError, RemoteError};
pub use ids::{BlobId, FolderId, RegistryId, SchemaId, TaskId};
pub use resource::{resources_under, RemoteResource};
pub use result::Result;
