//! Operational endpoint integration tests.
//!
//! Tests `/health`, `/ready`, `/metrics` and `/api/home` using the
//! `TestApiServer` harness. None of them require a token.

use arbitrage_api::repositories::InMemoryArbitrageStore;
use arbitrage_test_utils::TestApiServer;
use std::sync::Arc;

#[tokio::test]
async fn test_home_returns_welcome_text() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = reqwest::get(format!("{}/api/home", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "Welcome to the Arbitrage API!");

    Ok(())
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = reqwest::get(format!("{}/health", server.url())).await?;

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await?, "OK");

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_reports_healthy_store() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), 200);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.contains("application/json"));

    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["database"], "healthy");

    Ok(())
}

#[tokio::test]
async fn test_ready_endpoint_returns_503_when_store_down() -> Result<(), anyhow::Error> {
    let server =
        TestApiServer::spawn_with_store(Arc::new(InMemoryArbitrageStore::failing())).await?;

    let response = reqwest::get(format!("{}/ready", server.url())).await?;

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await?;
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["database"], "unhealthy");
    assert!(!body.to_string().contains("in-memory"));

    Ok(())
}

#[tokio::test]
async fn test_metrics_endpoint_is_public() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    // Generate at least one sample first
    reqwest::get(format!("{}/health", server.url())).await?;
    let response = reqwest::get(format!("{}/metrics", server.url())).await?;

    assert_eq!(response.status(), 200);

    Ok(())
}

#[tokio::test]
async fn test_health_does_not_contact_identity_provider() -> Result<(), anyhow::Error> {
    let server = TestApiServer::spawn().await?;

    reqwest::get(format!("{}/health", server.url())).await?;
    reqwest::get(format!("{}/api/home", server.url())).await?;

    assert_eq!(server.identity_provider_requests().await, 0);

    Ok(())
}
