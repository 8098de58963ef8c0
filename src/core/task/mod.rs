//! Asynchronous task and blob status polling

pub mod poller;

pub use poller::{upload_status, BlobOutcome, BlobStatusPoller, TaskPoller, TaskResult};
