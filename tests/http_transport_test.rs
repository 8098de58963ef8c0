//! Integration tests for the HTTP transport against a mock registry

use mockito::Matcher;
use registrar::adapters::registry::{query, HttpTransport, RegistryClient, Transport};
use registrar::config::{secret_string, AuthType, RegistryConfig, RetryConfig};
use registrar::core::cancel::CancelToken;
use registrar::domain::{RegistrarError, RemoteError};
use serde_json::json;

fn registry_config(base_url: String, auth_type: AuthType) -> RegistryConfig {
    RegistryConfig {
        base_url,
        auth_type,
        api_key: secret_string("sk_test".to_string()),
        timeout_seconds: 5,
        tls_verify: true,
        retry: RetryConfig {
            base_delay_secs: 1,
            max_retries: Some(0),
        },
    }
}

#[tokio::test]
async fn test_get_sends_basic_auth_and_parses_json() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/tasks/t_1")
        .match_header("authorization", "Basic c2tfdGVzdDo=")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"status": "SUCCEEDED"}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&registry_config(server.url(), AuthType::Basic)).unwrap();
    let body = transport.get("tasks/t_1", &[]).await.unwrap();

    assert_eq!(body["status"], "SUCCEEDED");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_bearer_auth_and_query_parameters() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/aa-sequences")
        .match_header("authorization", "Bearer sk_test")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("aminoAcids".into(), "MAAS".into()),
            Matcher::UrlEncoded("registryId".into(), "src_1".into()),
        ]))
        .with_status(200)
        .with_body(r#"{"aaSequences": []}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&registry_config(server.url(), AuthType::Bearer)).unwrap();
    let params = query(&[("aminoAcids", "MAAS"), ("registryId", "src_1")]);
    let body = transport.get("aa-sequences", &params).await.unwrap();

    assert_eq!(body["aaSequences"], json!([]));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/blobs:start-multipart-upload")
        .match_body(Matcher::Json(json!({
            "name": "plate.csv",
            "mimeType": "text/csv",
            "type": "RAW_FILE"
        })))
        .with_status(200)
        .with_body(r#"{"blobId": "blob_1"}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&registry_config(server.url(), AuthType::Basic)).unwrap();
    let body = transport
        .post(
            "blobs:start-multipart-upload",
            &json!({"name": "plate.csv", "mimeType": "text/csv", "type": "RAW_FILE"}),
        )
        .await
        .unwrap();

    assert_eq!(body["blobId"], "blob_1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_429_is_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/tasks/t_1")
        .with_status(429)
        .with_body(r#"{"error": {"message": "Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&registry_config(server.url(), AuthType::Basic)).unwrap();
    let err = transport.get("tasks/t_1", &[]).await.unwrap_err();

    assert!(err.is_rate_limited());
    assert_eq!(err.status(), Some(429));
}

#[tokio::test]
async fn test_400_keeps_error_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/registries/src_1:register-entities")
        .with_status(400)
        .with_body(r#"{"error": {"type": "invalid_request_error", "message": "Name collision"}}"#)
        .create_async()
        .await;

    let transport = HttpTransport::new(&registry_config(server.url(), AuthType::Basic)).unwrap();
    let err = transport
        .post("registries/src_1:register-entities", &json!({"entityIds": []}))
        .await
        .unwrap_err();

    match err {
        RegistrarError::Remote(RemoteError::RequestFailed { status, body }) => {
            assert_eq!(status, 400);
            assert_eq!(body["error"]["message"], "Name collision");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_client_gives_up_when_retries_are_exhausted() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/blobs/blob_1")
        .with_status(429)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = RegistryClient::from_config(
        &registry_config(server.url(), AuthType::Basic),
        CancelToken::none(),
    )
    .unwrap();
    let err = client.get("blobs/blob_1", &[]).await.unwrap_err();

    assert!(matches!(
        err,
        RegistrarError::Remote(RemoteError::RetriesExhausted { attempts: 1 })
    ));
    mock.assert_async().await;
}
