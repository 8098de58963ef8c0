//! Blob uploads
//!
//! - [`checksum`] - MD5 and base64 encoding of payload bytes
//! - [`chunker`] - fixed-size chunking of an async reader
//! - [`session`] - one multipart upload and its state machine
//! - [`uploader`] - single-part or multipart selection, abort on failure

pub mod checksum;
pub mod chunker;
pub mod session;
pub mod uploader;

pub use chunker::ChunkReader;
pub use session::{BlobMetadata, PartDescriptor, SessionState, UploadSession};
pub use uploader::BlobUploader;
