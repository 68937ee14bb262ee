//! E2E tests for the datastore report variants

mod common;

use common::{RETURN_URL, TestServer, spawn_datastore_stub, test_config};
use reportview::config::ServerVariant;

async fn datastore_server(variant: ServerVariant) -> TestServer {
    let mut config = test_config(variant);
    config.datastore.url = Some(spawn_datastore_stub().await);
    TestServer::start(config).await
}

#[tokio::test]
async fn missing_email_returns_400() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body = response.text().await.unwrap();
    assert!(body.contains("Missing Email Address"));
}

#[tokio::test]
async fn matching_row_renders_stored_report() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report?email=a@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("<p>Hi</p>"));
    assert!(body.contains("a@x.com"));
    assert!(body.contains(RETURN_URL));
    assert_eq!(body.matches("Done - Return to Dashboard").count(), 1);
}

#[tokio::test]
async fn no_matching_row_returns_404() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report?email=missing@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body = response.text().await.unwrap();
    assert!(body.contains("Report Not Found"));
}

#[tokio::test]
async fn row_without_content_returns_404_not_ready() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report?email=empty@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body = response.text().await.unwrap();
    assert!(body.contains("check back later"));
}

#[tokio::test]
async fn query_error_returns_500_with_detail() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report?email=boom@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(body.contains("does not exist"));
}

#[tokio::test]
async fn latest_variant_requests_newest_row() {
    // The stub returns a different body when the latest-first ordering
    // is requested, so the assertion proves the query shape.
    let server = datastore_server(ServerVariant::DatastoreLatest).await;

    let response = server
        .client
        .get(server.url("/report?email=a@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("<p>Latest</p>"));
}

#[tokio::test]
async fn plain_variant_does_not_request_ordering() {
    let server = datastore_server(ServerVariant::Datastore).await;

    let response = server
        .client
        .get(server.url("/report?email=a@x.com"))
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("<p>Hi</p>"));
    assert!(!body.contains("<p>Latest</p>"));
}

#[tokio::test]
async fn unconfigured_datastore_returns_500_config_error() {
    let mut config = test_config(ServerVariant::Datastore);
    config.datastore.url = None;
    let server = TestServer::start(config).await;

    let response = server
        .client
        .get(server.url("/report?email=a@x.com"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(body.contains("datastore.url is not configured"));
}
