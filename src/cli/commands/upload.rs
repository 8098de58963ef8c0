//! Upload blob command implementation
//!
//! Uploads a local file as a blob. Files larger than the chunk size go
//! through a multipart session that is aborted on the server if any step
//! fails or the command is interrupted.

use super::{connect, load_or_report, report_error, EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::schema::MIN_CHUNK_SIZE_BYTES;
use crate::core::upload::BlobUploader;
use crate::log_operation_start;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the upload-blob command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Blob name (defaults to the file name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Override the configured chunk size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

impl UploadArgs {
    /// Execute the upload-blob command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        log_operation_start!("upload-blob", self.file.display());

        let config = match load_or_report(config_path) {
            Ok(config) => config,
            Err(code) => return Ok(code),
        };

        if let Some(chunk_size) = self.chunk_size {
            if chunk_size < MIN_CHUNK_SIZE_BYTES {
                println!("❌ --chunk-size must be at least {MIN_CHUNK_SIZE_BYTES} bytes");
                return Ok(EXIT_CONFIG);
            }
        }

        let client = match connect(&config, shutdown_signal) {
            Ok(client) => client,
            Err(e) => return Ok(report_error(&e, "Failed to create registry client")),
        };

        let mut uploader = BlobUploader::new(client, &config.upload);
        if let Some(chunk_size) = self.chunk_size {
            uploader = uploader.with_chunk_size(chunk_size);
        }

        println!("📤 Uploading {}", self.file.display());
        println!("   Chunk size: {} bytes", uploader.chunk_size());

        match uploader.upload_file(&self.file, self.name.as_deref()).await {
            Ok(blob) => {
                println!("✅ Upload complete");
                println!("   Blob ID: {}", blob.id().unwrap_or("-"));
                if let Some(name) = blob.name() {
                    println!("   Name: {name}");
                }
                Ok(EXIT_SUCCESS)
            }
            Err(e) => Ok(report_error(&e, "Upload failed")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = UploadArgs {
            file: dir.path().join("plate.csv"),
            name: None,
            chunk_size: None,
        };
        let (_tx, rx) = watch::channel(false);

        let missing = dir.path().join("missing.toml");
        let code = args.execute(&missing.to_string_lossy(), rx).await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
