//! HDX client tests against a mock CKAN action API

mod common;

use common::{not_found, ok, write_country_files, OWNER_ORG};
use gem_publisher::config::{HdxConfig, HdxSite};
use gem_publisher::dataset::{Dataset, DatasetBuilder};
use gem_publisher::hdx::{DatasetRepository, HdxClient, RunStamp, UpsertAction, UPDATED_BY_SCRIPT};
use gem_publisher::template::DatasetTemplate;
use gem_publisher::PublishError;
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, body_partial_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client(server: &MockServer) -> HdxClient {
    client_with_timeout(server, Duration::from_secs(10))
}

fn client_with_timeout(server: &MockServer, timeout: Duration) -> HdxClient {
    HdxClient::new(&HdxConfig {
        site: HdxSite::Custom(server.uri()),
        api_key: "test-key".to_string(),
        user_agent: "gem-tests".to_string(),
        timeout,
    })
    .expect("client")
}

fn khm_dataset(dir: &TempDir) -> Dataset {
    write_country_files(dir.path(), "KHM");
    DatasetBuilder::new(dir.path(), DatasetTemplate::embedded().expect("template"))
        .build(common::country("KHM"))
        .expect("dataset")
}

async fn mount_reorder(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/3/action/package_resource_reorder"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({"id": "pkg-khm"}))))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_find_missing_dataset_returns_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .and(query_param("id", "khm-adpc-gem"))
        .and(header("authorization", "test-key"))
        .and(header("user-agent", "gem-tests"))
        .respond_with(ResponseTemplate::new(404).set_body_json(not_found()))
        .expect(1)
        .mount(&server)
        .await;

    let found = client(&server).find_by_name("khm-adpc-gem").await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_create_uploads_all_resources() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dataset = khm_dataset(&dir);

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_create"))
        .and(body_partial_json(json!({
            "name": "khm-adpc-gem",
            "title": "Cambodia - Gender Equality Monitor",
            "owner_org": OWNER_ORG,
            "groups": [{"name": "khm"}],
            "dataset_date": "[2012-01-01T00:00:00 TO 2022-12-31T23:59:59]"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "pkg-khm",
            "name": "khm-adpc-gem",
            "resources": []
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "res-new",
            "name": "uploaded"
        }))))
        .expect(9)
        .mount(&server)
        .await;

    mount_reorder(&server).await;

    let stamp = RunStamp::new(UPDATED_BY_SCRIPT);
    let outcome = client(&server).upsert(&dataset, None, &stamp).await.unwrap();

    assert_eq!(outcome.action, UpsertAction::Created);
    assert_eq!(outcome.dataset_id, "pkg-khm");
    assert_eq!(outcome.resources_uploaded, 9);
    assert_eq!(outcome.resources_removed, 0);
    assert!(outcome.bytes_uploaded > 0);
}

#[tokio::test]
async fn test_update_reuses_resources_and_removes_stale_ones() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dataset = khm_dataset(&dir);

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .and(query_param("id", "khm-adpc-gem"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "pkg-khm",
            "name": "khm-adpc-gem",
            "resources": [
                {"id": "res-1", "name": "khm-gem-gii-national.csv", "format": "csv"},
                {"id": "res-old", "name": "khm-gem-legacy.csv", "format": "csv"}
            ]
        }))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_patch"))
        .and(body_partial_json(json!({"id": "pkg-khm", "name": "khm-adpc-gem"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "pkg-khm",
            "name": "khm-adpc-gem"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "res-1",
            "name": "khm-gem-gii-national.csv"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "res-new",
            "name": "uploaded"
        }))))
        .expect(8)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_delete"))
        .and(body_json(json!({"id": "res-old"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
        .expect(1)
        .mount(&server)
        .await;

    mount_reorder(&server).await;

    let client = client(&server);
    let existing = client.find_by_name("khm-adpc-gem").await.unwrap().unwrap();
    let stamp = RunStamp::new(UPDATED_BY_SCRIPT);
    let outcome = client.upsert(&dataset, Some(&existing), &stamp).await.unwrap();

    assert_eq!(outcome.action, UpsertAction::Updated);
    assert_eq!(outcome.resources_uploaded, 9);
    assert_eq!(outcome.resources_removed, 1);
}

#[tokio::test]
async fn test_update_removes_duplicate_named_resource() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dataset = khm_dataset(&dir);

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "pkg-khm",
            "name": "khm-adpc-gem",
            "resources": [
                {"id": "res-1", "name": "khm-gem-gii-national.csv", "format": "csv"},
                {"id": "res-1-copy", "name": "khm-gem-gii-national.csv", "format": "csv"}
            ]
        }))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_patch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "pkg-khm",
            "name": "khm-adpc-gem"
        }))))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "res-1",
            "name": "khm-gem-gii-national.csv"
        }))))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!({
            "id": "res-new",
            "name": "uploaded"
        }))))
        .expect(8)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/resource_delete"))
        .and(body_json(json!({"id": "res-1-copy"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!(null))))
        .expect(1)
        .mount(&server)
        .await;

    mount_reorder(&server).await;

    let client = client(&server);
    let existing = client.find_by_name("khm-adpc-gem").await.unwrap().unwrap();
    let stamp = RunStamp::new(UPDATED_BY_SCRIPT);
    let outcome = client.upsert(&dataset, Some(&existing), &stamp).await.unwrap();

    assert_eq!(outcome.resources_uploaded, 9);
    assert_eq!(outcome.resources_removed, 1);
}

#[tokio::test]
async fn test_slow_response_is_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(not_found())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = client_with_timeout(&server, Duration::from_secs(1));
    let err = client.find_by_name("khm-adpc-gem").await.unwrap_err();

    match err {
        PublishError::Timeout { operation, secs } => {
            assert_eq!(operation, "HDX package_show");
            assert_eq!(secs, 1);
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_validation_error_is_reported() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let dataset = khm_dataset(&dir);

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_create"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "success": false,
            "error": {"__type": "Validation Error", "name": ["That URL is already in use."]}
        })))
        .mount(&server)
        .await;

    let stamp = RunStamp::new(UPDATED_BY_SCRIPT);
    let err = client(&server).upsert(&dataset, None, &stamp).await.unwrap_err();

    match err {
        PublishError::Api {
            action,
            status,
            message,
        } => {
            assert_eq!(action, "package_create");
            assert_eq!(status, Some(409));
            assert!(message.contains("That URL is already in use."));
        },
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = client(&server).find_by_name("khm-adpc-gem").await.unwrap_err();
    assert!(matches!(err, PublishError::Api { status: Some(502), ref message, .. } if message == "Bad Gateway"));
}

#[tokio::test]
async fn test_write_access_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/organization_list_for_user"))
        .and(query_param("permission", "create_dataset"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok(json!([
            {"id": OWNER_ORG, "name": "adpc"}
        ]))))
        .mount(&server)
        .await;

    let client = client(&server);
    client.check_write_access(OWNER_ORG).await.unwrap();
    client.check_write_access("adpc").await.unwrap();

    let err = client.check_write_access("someone-else").await.unwrap_err();
    assert!(matches!(err, PublishError::AccessDenied(_)));
    assert!(err.is_fatal());
}
