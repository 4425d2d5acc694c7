//! Integration tests for the file-backed credential store.

use std::sync::Arc;

use dokumen_api::{
    ApiClient, BaseUrl, ClientConfig, Credential, CredentialStore, FileCredentialStore,
    StorageError,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test]
fn test_credential_and_context_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    {
        let store = FileCredentialStore::open(&file).unwrap();
        assert!(store.get().is_empty());
        store.set(Credential::new("T1", Some("R1".to_string())));
        store.set_context("2025");
    }

    let reopened = FileCredentialStore::open(&file).unwrap();
    assert_eq!(reopened.get().access_token(), Some("T1"));
    assert_eq!(reopened.get().refresh_token(), Some("R1"));
    assert_eq!(reopened.context().as_deref(), Some("2025"));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(document["access_token"], "T1");
    assert_eq!(document["selected_year"], "2025");
}

#[test]
fn test_corrupt_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");
    std::fs::write(&file, "{not json").unwrap();

    let result = FileCredentialStore::open(&file);
    assert!(matches!(result, Err(StorageError::Corrupt { .. })));
}

#[tokio::test]
async fn test_refreshed_credential_is_persisted() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let store = Arc::new(FileCredentialStore::open(&file).unwrap());
    store.set(Credential::new("T1", Some("R1".to_string())));

    let config = ClientConfig::builder()
        .base_url(BaseUrl::new(format!("{}/api", server.uri())).unwrap())
        .build()
        .unwrap();
    let client = ApiClient::new(config, store).unwrap();

    Mock::given(method("GET"))
        .and(path("/api/dokumen"))
        .and(header("Authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"token": {"access_token": "T2", "refresh_token": "R2"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/dokumen"))
        .and(header("Authorization", "Bearer T2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&server)
        .await;

    client.get("dokumen").await.unwrap();

    let reopened = FileCredentialStore::open(&file).unwrap();
    assert_eq!(reopened.get().access_token(), Some("T2"));
    assert_eq!(reopened.get().refresh_token(), Some("R2"));
}
