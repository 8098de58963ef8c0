//! Multipart upload session
//!
//! One session is one server-side multipart upload. The session owns the part
//! counter and the ordered list of acknowledged parts, and only moves forward:
//!
//! ```text
//! Started -> Uploading -> Completing -> Completed
//!    \          \             \
//!     +----------+-------------+------> Aborted
//! ```
//!
//! A session that has been aborted can never be completed, and `complete`
//! always sends the full part list in upload order.

use super::checksum::encode_chunk;
use crate::adapters::registry::models::{
    CompleteUploadRequest, PartRef, StartMultipartUploadRequest, StartMultipartUploadResponse,
    UploadPartRequest,
};
use crate::adapters::registry::RegistryClient;
use crate::domain::{BlobId, RegistrarError, RemoteError, RemoteResource, Result};

/// Name and type of the blob being uploaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobMetadata {
    pub name: String,
    pub mime_type: String,
    pub blob_type: String,
}

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    Uploading,
    Completing,
    Completed,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Aborted)
    }
}

/// An acknowledged part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartDescriptor {
    pub part_number: u32,
    pub e_tag: String,
    pub md5: String,
    pub len: usize,
}

/// One in-flight multipart upload
#[derive(Debug)]
pub struct UploadSession {
    client: RegistryClient,
    blob_id: BlobId,
    part_number: u32,
    parts: Vec<PartDescriptor>,
    state: SessionState,
}

impl UploadSession {
    /// Open a multipart upload on the server
    ///
    /// # Errors
    ///
    /// Any transport error, or `InvalidResponse` when the reply lacks a
    /// `blobId`. Nothing needs aborting in either case.
    pub async fn start(client: &RegistryClient, metadata: &BlobMetadata) -> Result<Self> {
        let request = StartMultipartUploadRequest {
            name: metadata.name.clone(),
            mime_type: metadata.mime_type.clone(),
            blob_type: metadata.blob_type.clone(),
        };

        let body = client
            .post_json("blobs:start-multipart-upload", &request)
            .await?;
        let response: StartMultipartUploadResponse =
            serde_json::from_value(body).map_err(|e| {
                RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                    "start-multipart-upload: {e}"
                )))
            })?;
        let blob_id = BlobId::new(response.blob_id).map_err(|e| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "start-multipart-upload: {e}"
            )))
        })?;

        tracing::info!(blob_id = %blob_id, name = %metadata.name, "Started multipart upload");

        Ok(Self {
            client: client.clone(),
            blob_id,
            part_number: 0,
            parts: Vec::new(),
            state: SessionState::Started,
        })
    }

    pub fn blob_id(&self) -> &BlobId {
        &self.blob_id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn parts(&self) -> &[PartDescriptor] {
        &self.parts
    }

    /// Total bytes acknowledged so far
    pub fn bytes_uploaded(&self) -> usize {
        self.parts.iter().map(|p| p.len).sum()
    }

    /// Upload the next chunk as part `partNumber + 1`
    pub async fn upload_part(&mut self, chunk: &[u8]) -> Result<&PartDescriptor> {
        self.expect_state(&[SessionState::Started, SessionState::Uploading], "upload a part")?;

        self.part_number += 1;
        self.state = SessionState::Uploading;

        let encoded = encode_chunk(chunk);
        let request = UploadPartRequest {
            data64: encoded.data64,
            md5: encoded.md5.clone(),
            part_number: self.part_number,
        };

        let path = format!("blobs/{}/parts", self.blob_id);
        let body = self.client.post_json(&path, &request).await?;
        let ack: PartRef = serde_json::from_value(body).map_err(|e| {
            RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "part {} of blob {}: {e}",
                self.part_number, self.blob_id
            )))
        })?;

        if ack.part_number != self.part_number {
            return Err(RegistrarError::Remote(RemoteError::InvalidResponse(format!(
                "blob {} acknowledged part {} for part {}",
                self.blob_id, ack.part_number, self.part_number
            ))));
        }

        tracing::debug!(
            blob_id = %self.blob_id,
            part_number = self.part_number,
            bytes = encoded.len,
            "Uploaded part"
        );

        self.parts.push(PartDescriptor {
            part_number: ack.part_number,
            e_tag: ack.e_tag,
            md5: encoded.md5,
            len: encoded.len,
        });

        // The push above guarantees a last element.
        Ok(&self.parts[self.parts.len() - 1])
    }

    /// Finish the upload with every acknowledged part, in order
    ///
    /// # Errors
    ///
    /// `Validation` if no part was uploaded, otherwise any transport error.
    pub async fn complete(&mut self) -> Result<RemoteResource> {
        self.expect_state(&[SessionState::Uploading, SessionState::Started], "complete")?;

        if self.parts.is_empty() {
            return Err(RegistrarError::Validation(format!(
                "multipart upload of blob {} has no parts to complete",
                self.blob_id
            )));
        }

        self.state = SessionState::Completing;

        let request = CompleteUploadRequest {
            parts: self
                .parts
                .iter()
                .map(|p| PartRef {
                    e_tag: p.e_tag.clone(),
                    part_number: p.part_number,
                })
                .collect(),
        };

        let path = format!("blobs/{}:complete-upload", self.blob_id);
        let blob = self.client.post_resource(&path, &request).await?;
        self.state = SessionState::Completed;

        tracing::info!(
            blob_id = %self.blob_id,
            parts = self.parts.len(),
            bytes = self.bytes_uploaded(),
            "Completed multipart upload"
        );

        Ok(blob)
    }

    /// Best-effort server-side abort
    ///
    /// Runs on a detached client so it still goes out after a shutdown
    /// signal. Failures are logged and swallowed. No-op once the session is
    /// terminal.
    pub async fn abort(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        let path = format!("blobs/{}:abort-upload", self.blob_id);
        match self
            .client
            .detached()
            .post(&path, &serde_json::Value::Object(Default::default()))
            .await
        {
            Ok(_) => tracing::warn!(blob_id = %self.blob_id, parts = self.parts.len(), "Aborted multipart upload"),
            Err(e) => tracing::error!(
                blob_id = %self.blob_id,
                error = %e,
                "Failed to abort multipart upload"
            ),
        }

        self.state = SessionState::Aborted;
    }

    fn expect_state(&self, allowed: &[SessionState], action: &str) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RegistrarError::Validation(format!(
                "cannot {action} on blob {} in state {:?}",
                self.blob_id, self.state
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::registry::scripted::{Method, Reply, ScriptedTransport};
    use crate::core::backoff::BackoffPolicy;
    use crate::core::cancel::CancelToken;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn metadata() -> BlobMetadata {
        BlobMetadata {
            name: "reads.fastq".to_string(),
            mime_type: "application/octet-stream".to_string(),
            blob_type: "RAW_FILE".to_string(),
        }
    }

    fn setup() -> (Arc<ScriptedTransport>, RegistryClient) {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("blobs:start-multipart-upload", json!({"blobId": "b1"}));
        let client = RegistryClient::new(
            transport.clone(),
            BackoffPolicy::new(Duration::from_secs(1), None),
            CancelToken::none(),
        );
        (transport, client)
    }

    #[tokio::test]
    async fn test_parts_are_numbered_in_order() {
        let (transport, client) = setup();
        transport
            .on_post("blobs/b1/parts", json!({"eTag": "e1", "partNumber": 1}))
            .on_post("blobs/b1/parts", json!({"eTag": "e2", "partNumber": 2}))
            .on_post("blobs/b1:complete-upload", json!({"id": "b1", "uploadStatus": "COMPLETE"}));

        let mut session = UploadSession::start(&client, &metadata()).await.unwrap();
        assert_eq!(session.state(), SessionState::Started);

        session.upload_part(b"first").await.unwrap();
        session.upload_part(b"second").await.unwrap();
        let blob = session.complete().await.unwrap();

        assert_eq!(blob.id(), Some("b1"));
        assert_eq!(session.state(), SessionState::Completed);
        assert_eq!(session.bytes_uploaded(), 11);

        let complete = transport.calls_to(Method::Post, "blobs/b1:complete-upload");
        assert_eq!(
            complete[0].body,
            Some(json!({"parts": [
                {"eTag": "e1", "partNumber": 1},
                {"eTag": "e2", "partNumber": 2}
            ]}))
        );

        let parts = transport.calls_to(Method::Post, "blobs/b1/parts");
        assert_eq!(parts[0].body.as_ref().unwrap()["md5"], md5_of(b"first"));
    }

    fn md5_of(data: &[u8]) -> String {
        super::super::checksum::md5_hex(data)
    }

    #[tokio::test]
    async fn test_complete_without_parts_is_rejected() {
        let (transport, client) = setup();
        let mut session = UploadSession::start(&client, &metadata()).await.unwrap();

        let err = session.complete().await.unwrap_err();
        assert!(matches!(err, RegistrarError::Validation(_)));
        assert_eq!(transport.count(Method::Post, "blobs/b1:complete-upload"), 0);
    }

    #[tokio::test]
    async fn test_no_complete_after_abort() {
        let (transport, client) = setup();
        transport
            .on_post("blobs/b1/parts", json!({"eTag": "e1", "partNumber": 1}))
            .on_post("blobs/b1:abort-upload", json!({}));

        let mut session = UploadSession::start(&client, &metadata()).await.unwrap();
        session.upload_part(b"data").await.unwrap();
        session.abort().await;
        session.abort().await;

        assert_eq!(session.state(), SessionState::Aborted);
        assert!(session.complete().await.is_err());
        assert!(session.upload_part(b"more").await.is_err());
        assert_eq!(transport.count(Method::Post, "blobs/b1:abort-upload"), 1);
        assert_eq!(transport.count(Method::Post, "blobs/b1:complete-upload"), 0);
    }

    #[tokio::test]
    async fn test_abort_failure_is_swallowed() {
        let (transport, client) = setup();
        transport.reply(
            Method::Post,
            "blobs/b1:abort-upload",
            Reply::Status(500, json!({})),
        );

        let mut session = UploadSession::start(&client, &metadata()).await.unwrap();
        session.abort().await;
        assert_eq!(session.state(), SessionState::Aborted);
    }

    #[tokio::test]
    async fn test_start_without_blob_id_is_invalid() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on_post("blobs:start-multipart-upload", json!({}));
        let client = RegistryClient::new(transport, BackoffPolicy::default(), CancelToken::none());

        let err = UploadSession::start(&client, &metadata()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistrarError::Remote(RemoteError::InvalidResponse(_))
        ));
    }
}
