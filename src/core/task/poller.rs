//! Polling of long-running server work
//!
//! Bulk endpoints hand back a task id, and blob uploads finish asynchronously
//! on the server. Both are observed by polling a status resource at a fixed
//! interval until it reaches a terminal state. Intermediate polls never
//! return to the caller.

use crate::adapters::registry::models::{TaskHandle, TaskStatusResponse, UploadStatus};
use crate::adapters::registry::RegistryClient;
use crate::config::{TaskConfig, UploadConfig};
use crate::core::cancel::CancelToken;
use crate::domain::{BlobId, RegistrarError, RemoteError, RemoteResource, Result};
use serde_json::Value;
use std::time::Duration;

/// Terminal state of a task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    /// `SUCCEEDED` with the task's `response` payload
    Succeeded(Value),
    /// `FAILED` with the server's message and per-item errors
    Failed { message: String, errors: Vec<Value> },
}

impl TaskResult {
    /// Turn a failed task into [`RegistrarError::TaskFailed`]
    pub fn into_result(self) -> Result<Value> {
        match self {
            TaskResult::Succeeded(response) => Ok(response),
            TaskResult::Failed { message, errors } => {
                Err(RegistrarError::TaskFailed { message, errors })
            }
        }
    }
}

/// Terminal state of a blob upload
#[derive(Debug, Clone, PartialEq)]
pub enum BlobOutcome {
    Complete(RemoteResource),
    Aborted,
}

/// Waits for bulk tasks to finish
#[derive(Debug, Clone)]
pub struct TaskPoller {
    client: RegistryClient,
    interval: Duration,
    max_wait: Option<Duration>,
}

impl TaskPoller {
    pub fn new(client: RegistryClient, interval: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            client,
            interval,
            max_wait,
        }
    }

    pub fn from_config(client: RegistryClient, config: &TaskConfig) -> Self {
        Self::new(client, config.poll_interval(), config.max_wait())
    }

    /// Poll `tasks/{taskId}` until it leaves `RUNNING`
    ///
    /// # Errors
    ///
    /// Transport errors, `InvalidResponse` for an unknown status,
    /// `Cancelled`, or `DeadlineExceeded` once `max_wait` elapses.
    pub async fn wait(&self, handle: &TaskHandle) -> Result<TaskResult> {
        let cancel = self.scoped_cancel();
        let client = self.client.with_cancel(cancel.clone());
        let path = format!("tasks/{}", handle.task_id);
        let mut polls = 0u32;

        loop {
            let body = client.get(&path, &[]).await?;
            let status: TaskStatusResponse = serde_json::from_value(body).map_err(|e| {
                RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                    "task {}: {e}",
                    handle.task_id
                )))
            })?;
            polls += 1;

            match status.status.as_str() {
                "RUNNING" => {
                    tracing::debug!(task_id = %handle.task_id, polls, "Task still running");
                    cancel.sleep(&path, self.interval).await?;
                }
                "SUCCEEDED" => {
                    tracing::info!(task_id = %handle.task_id, polls, "Task succeeded");
                    return Ok(TaskResult::Succeeded(status.response.unwrap_or(Value::Null)));
                }
                "FAILED" => {
                    let message = status.message.unwrap_or_default();
                    tracing::warn!(task_id = %handle.task_id, polls, message = %message, "Task failed");
                    return Ok(TaskResult::Failed {
                        message,
                        errors: status.errors.unwrap_or_default(),
                    });
                }
                other => {
                    return Err(RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                        "task {} has unknown status '{other}'",
                        handle.task_id
                    ))))
                }
            }
        }
    }

    /// Wait for a task and turn `FAILED` into an error
    pub async fn wait_for_success(&self, handle: &TaskHandle) -> Result<Value> {
        self.wait(handle).await?.into_result()
    }

    fn scoped_cancel(&self) -> CancelToken {
        let base = self.client.cancel_token();
        match self.max_wait {
            Some(limit) => base.with_timeout(limit),
            None => base.clone(),
        }
    }
}

/// Waits for a blob to leave `IN_PROGRESS`
#[derive(Debug, Clone)]
pub struct BlobStatusPoller {
    client: RegistryClient,
    interval: Duration,
    max_wait: Option<Duration>,
}

impl BlobStatusPoller {
    pub fn new(client: RegistryClient, interval: Duration, max_wait: Option<Duration>) -> Self {
        Self {
            client,
            interval,
            max_wait,
        }
    }

    pub fn from_config(client: RegistryClient, config: &UploadConfig) -> Self {
        Self::new(client, config.status_poll_interval(), config.max_wait())
    }

    /// Poll `blobs/{blobId}` until `uploadStatus` is terminal
    ///
    /// # Errors
    ///
    /// Transport errors, `Cancelled`, or `DeadlineExceeded` once `max_wait`
    /// elapses.
    pub async fn wait(&self, blob_id: &BlobId) -> Result<BlobOutcome> {
        let cancel = match self.max_wait {
            Some(limit) => self.client.cancel_token().with_timeout(limit),
            None => self.client.cancel_token().clone(),
        };
        let client = self.client.with_cancel(cancel.clone());
        let path = format!("blobs/{blob_id}");

        loop {
            let blob = client.get_resource(&path).await?;

            match upload_status(&blob)? {
                UploadStatus::InProgress => {
                    tracing::debug!(blob_id = %blob_id, "Waiting for blob to complete uploading");
                    cancel.sleep(&path, self.interval).await?;
                }
                UploadStatus::Aborted => {
                    tracing::warn!(blob_id = %blob_id, "Blob upload aborted by the server");
                    return Ok(BlobOutcome::Aborted);
                }
                UploadStatus::Complete => return Ok(BlobOutcome::Complete(blob)),
            }
        }
    }
}

/// Read `uploadStatus` off a blob resource
pub fn upload_status(blob: &RemoteResource) -> Result<UploadStatus> {
    let raw = blob.get("uploadStatus").cloned().unwrap_or(Value::Null);
    serde_json::from_value(raw.clone()).map_err(|_| {
        RegistrarError::Remote(RemoteError::InvalidResponse(format!(
            "blob {} has unknown uploadStatus {raw}",
            blob.id().unwrap_or("<unknown>")
        )))
    })
}
