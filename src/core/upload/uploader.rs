//! Blob upload orchestration
//!
//! Picks the single-request path for payloads at or below the chunk limit and
//! a multipart [`UploadSession`] for anything larger. A multipart upload that
//! fails after it started is aborted on the server before the error is
//! returned.

use super::checksum::encode_chunk;
use super::chunker::ChunkReader;
use super::session::{BlobMetadata, UploadSession};
use crate::adapters::registry::models::{CreateBlobRequest, UploadStatus};
use crate::adapters::registry::RegistryClient;
use crate::config::UploadConfig;
use crate::core::task::{upload_status, BlobOutcome, BlobStatusPoller};
use crate::domain::{BlobId, RegistrarError, RemoteError, RemoteResource, Result};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Uploads files and byte streams as registry blobs
#[derive(Debug, Clone)]
pub struct BlobUploader {
    client: RegistryClient,
    chunk_size: usize,
    mime_type: String,
    blob_type: String,
    status: BlobStatusPoller,
}

impl BlobUploader {
    pub fn new(client: RegistryClient, config: &UploadConfig) -> Self {
        Self {
            status: BlobStatusPoller::from_config(client.clone(), config),
            client,
            chunk_size: config.chunk_size_bytes,
            mime_type: config.mime_type.clone(),
            blob_type: config.blob_type.clone(),
        }
    }

    /// Override the chunk limit
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Upload a file, named after its file name unless `name` is given
    ///
    /// # Example
    ///
    /// ```no_run
    /// use registrar::adapters::registry::RegistryClient;
    /// use registrar::config::load_config;
    /// use registrar::core::cancel::CancelToken;
    /// use registrar::core::upload::BlobUploader;
    ///
    /// # async fn example() -> registrar::domain::Result<()> {
    /// let config = load_config("registrar.toml")?;
    /// let client = RegistryClient::from_config(&config.registry, CancelToken::none())?;
    /// let uploader = BlobUploader::new(client, &config.upload);
    /// let blob = uploader.upload_file("plate_reader.csv", None).await?;
    /// println!("Uploaded blob {:?}", blob.id());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<RemoteResource> {
        let path = path.as_ref();
        let name = match name {
            Some(name) => name.to_string(),
            None => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| {
                    RegistrarError::Validation(format!(
                        "cannot derive a blob name from {}",
                        path.display()
                    ))
                })?,
        };

        let file = tokio::fs::File::open(path).await?;
        let size = file.metadata().await?.len();

        tracing::info!(
            path = %path.display(),
            name = %name,
            size,
            chunk_size = self.chunk_size,
            "Uploading file"
        );

        self.upload_reader(file, size, &name).await
    }

    /// Upload `size` bytes read from `reader`
    ///
    /// `size` picks the path. A source announced at or below the chunk limit
    /// that turns out larger is switched to multipart, so no request ever
    /// carries more than one chunk.
    pub async fn upload_reader<R>(&self, mut reader: R, size: u64, name: &str) -> Result<RemoteResource>
    where
        R: AsyncRead + Unpin,
    {
        let metadata = BlobMetadata {
            name: name.to_string(),
            mime_type: self.mime_type.clone(),
            blob_type: self.blob_type.clone(),
        };

        if size > self.chunk_size as u64 {
            return self.upload_multipart(reader, &metadata).await;
        }

        let mut head = Vec::new();
        (&mut reader)
            .take(self.chunk_size as u64 + 1)
            .read_to_end(&mut head)
            .await?;

        if head.len() <= self.chunk_size {
            return self.upload_single(&head, &metadata).await;
        }

        tracing::warn!(
            name = %metadata.name,
            announced = size,
            chunk_size = self.chunk_size,
            "Source is larger than announced, switching to multipart upload"
        );
        let source = std::io::Cursor::new(head).chain(reader);
        self.upload_multipart(source, &metadata).await
    }

    async fn upload_single(&self, data: &[u8], metadata: &BlobMetadata) -> Result<RemoteResource> {
        let encoded = encode_chunk(data);

        let request = CreateBlobRequest {
            data64: encoded.data64,
            md5: encoded.md5,
            mime_type: metadata.mime_type.clone(),
            name: metadata.name.clone(),
            blob_type: metadata.blob_type.clone(),
        };

        let blob = self.client.post_resource("blobs", &request).await?;
        tracing::debug!(blob_id = ?blob.id(), bytes = encoded.len, "Created single-part blob");
        self.settle(blob).await
    }

    async fn upload_multipart<R>(&self, reader: R, metadata: &BlobMetadata) -> Result<RemoteResource>
    where
        R: AsyncRead + Unpin,
    {
        let mut session = UploadSession::start(&self.client, metadata).await?;

        match self.send_parts(&mut session, reader).await {
            Ok(blob) => self.settle(blob).await,
            Err(err) => {
                tracing::error!(
                    blob_id = %session.blob_id(),
                    parts = session.parts().len(),
                    error = %err,
                    "Multipart upload failed"
                );
                session.abort().await;
                Err(RegistrarError::UploadAborted {
                    blob_id: session.blob_id().to_string(),
                    source: Box::new(err),
                })
            }
        }
    }

    async fn send_parts<R>(&self, session: &mut UploadSession, reader: R) -> Result<RemoteResource>
    where
        R: AsyncRead + Unpin,
    {
        let mut chunks = ChunkReader::new(reader, self.chunk_size);
        while let Some(chunk) = chunks.next_chunk().await? {
            session.upload_part(&chunk).await?;
        }
        session.complete().await
    }

    /// Resolve a blob response to its terminal state
    async fn settle(&self, blob: RemoteResource) -> Result<RemoteResource> {
        let blob_id = blob
            .require_id("blob")
            .and_then(|id| {
                BlobId::new(id).map_err(|e| {
                    RegistrarError::Remote(RemoteError::InvalidResponse(e))
                })
            })?;

        let outcome = match upload_status(&blob)? {
            UploadStatus::Complete => BlobOutcome::Complete(blob),
            UploadStatus::Aborted => BlobOutcome::Aborted,
            UploadStatus::InProgress => self.status.wait(&blob_id).await?,
        };

        match outcome {
            BlobOutcome::Complete(blob) => {
                tracing::info!(blob_id = %blob_id, name = ?blob.name(), "Blob upload complete");
                Ok(blob)
            }
            BlobOutcome::Aborted => Err(RegistrarError::BlobAborted(blob_id.into_inner())),
        }
    }
}
