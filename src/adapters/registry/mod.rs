//! Registry API integration
//!
//! - [`transport`] - the `Transport` trait and response classification
//! - [`http`] - reqwest implementation with basic or bearer credentials
//! - [`scripted`] - in-memory transport used by tests and dry runs
//! - [`client`] - `RegistryClient`, which adds rate-limit backoff and cancellation
//! - [`models`] - request/response bodies for the blob, task and registry endpoints

pub mod client;
pub mod http;
pub mod models;
pub mod scripted;
pub mod transport;

pub use client::{query, RegistryClient};
pub use http::HttpTransport;
pub use models::{PartRef, TaskHandle, TaskStatusResponse, UploadStatus};
pub use scripted::ScriptedTransport;
pub use transport::{Query, Transport};
