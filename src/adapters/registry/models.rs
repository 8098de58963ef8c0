//! Registry API request and response models
//!
//! Wire shapes for the blob, task and registration endpoints. Entities read
//! back from the registry stay as [`RemoteResource`](crate::domain::RemoteResource)
//! since Registrar never interprets most of their fields.

use crate::domain::TaskId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST blobs:start-multipart-upload`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartUploadRequest {
    pub name: String,
    pub mime_type: String,
    #[serde(rename = "type")]
    pub blob_type: String,
}

/// Response of `POST blobs:start-multipart-upload`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartMultipartUploadResponse {
    pub blob_id: String,
}

/// Body of `POST blobs` (single-part upload)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlobRequest {
    pub data64: String,
    pub md5: String,
    pub mime_type: String,
    pub name: String,
    #[serde(rename = "type")]
    pub blob_type: String,
}

/// Body of `POST blobs/{blobId}/parts`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadPartRequest {
    pub data64: String,
    pub md5: String,
    pub part_number: u32,
}

/// One uploaded part as the server acknowledges it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartRef {
    #[serde(rename = "eTag")]
    pub e_tag: String,
    #[serde(rename = "partNumber")]
    pub part_number: u32,
}

/// Body of `POST blobs/{blobId}:complete-upload`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompleteUploadRequest {
    pub parts: Vec<PartRef>,
}

/// Upload status of a blob
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadStatus {
    InProgress,
    Complete,
    Aborted,
}

/// Handle returned by an asynchronous bulk endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub task_id: TaskId,
}

/// Response of `GET tasks/{taskId}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatusResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<Value>>,
    #[serde(default)]
    pub response: Option<Value>,
}

/// Body of `POST registries/{id}:register-entities`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEntitiesRequest {
    pub entity_ids: Vec<String>,
    pub naming_strategy: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_start_request_uses_type_key() {
        let req = StartMultipartUploadRequest {
            name: "plate.csv".to_string(),
            mime_type: "text/csv".to_string(),
            blob_type: "RAW_FILE".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"name": "plate.csv", "mimeType": "text/csv", "type": "RAW_FILE"})
        );
    }

    #[test]
    fn test_complete_request_shape() {
        let req = CompleteUploadRequest {
            parts: vec![PartRef {
                e_tag: "\"abc\"".to_string(),
                part_number: 1,
            }],
        };
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"parts": [{"eTag": "\"abc\"", "partNumber": 1}]})
        );
    }

    #[test]
    fn test_upload_status_parses() {
        let status: UploadStatus = serde_json::from_value(json!("IN_PROGRESS")).unwrap();
        assert_eq!(status, UploadStatus::InProgress);
    }

    #[test]
    fn test_failed_task_response() {
        let resp: TaskStatusResponse = serde_json::from_value(json!({
            "status": "FAILED",
            "message": "Your request was invalid.",
            "errors": [{"index": 1, "message": "Invalid amino acids"}]
        }))
        .unwrap();
        assert_eq!(resp.status, "FAILED");
        assert_eq!(resp.errors.unwrap().len(), 1);
        assert!(resp.response.is_none());
    }
}
