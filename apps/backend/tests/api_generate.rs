//! Generation API tests.

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use pretty_assertions::assert_eq;

use common::{StubGenerator, TestContext};
use serde_json::json;

/// The generated set has the requested size and is persisted.
#[tokio::test]
async fn test_generate_persists_set() {
    let generator = Arc::new(StubGenerator::new());
    let ctx = TestContext::with_generator(generator.clone()).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = ctx.create_session().await;

    let response = server
        .post("/api/v1/generate")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({ "topic": "Ancient Rome", "count": 5 }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    assert_eq!(body["topic"], "Ancient Rome");
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 5);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

    let set_id = body["id"].as_str().unwrap();
    let stored = ctx.db.get_set(set_id).await.unwrap();
    assert_eq!(stored.unwrap().flashcards.len(), 5);
}

/// Generation requires a session like every other data endpoint.
#[tokio::test]
async fn test_generate_requires_auth() {
    let ctx = TestContext::new().await;
    let server = TestServer::new(ctx.router()).unwrap();

    let response = server
        .post("/api/v1/generate")
        .json(&json!({ "topic": "Ancient Rome", "count": 5 }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

/// Empty topics and out-of-range counts are rejected before delegation.
#[tokio::test]
async fn test_generate_validates_input() {
    let generator = Arc::new(StubGenerator::new());
    let ctx = TestContext::with_generator(generator.clone()).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = ctx.create_session().await;

    for payload in [
        json!({ "topic": "  ", "count": 5 }),
        json!({ "topic": "Ancient Rome", "count": 0 }),
        json!({ "topic": "Ancient Rome", "count": 101 }),
    ] {
        let response = server
            .post("/api/v1/generate")
            .add_header(
                axum::http::header::AUTHORIZATION,
                TestContext::auth_header_value(&token),
            )
            .json(&payload)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

/// Upstream failure surfaces as a 502 and leaves nothing behind.
#[tokio::test]
async fn test_generate_upstream_failure_502() {
    let ctx = TestContext::with_generator(Arc::new(StubGenerator::failing())).await;
    let server = TestServer::new(ctx.router()).unwrap();
    let token = ctx.create_session().await;

    let response = server
        .post("/api/v1/generate")
        .add_header(
            axum::http::header::AUTHORIZATION,
            TestContext::auth_header_value(&token),
        )
        .json(&json!({ "topic": "Ancient Rome", "count": 5 }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    assert_eq!(ctx.db.count_sets().await.unwrap(), 0);
}
