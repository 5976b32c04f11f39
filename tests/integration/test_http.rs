//! HTTP surface: envelope wrapping and the token gatekeeper.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use nlq_gateway::config::{AuthConfig, ServerConfig};
use nlq_gateway::{create_rest_router, Authenticator};
use tower::ServiceExt;

use super::support::{gateway, MemoryExecutor, ScriptedOracle};

const SECRET: &str = "integration-secret";

fn authenticator() -> Authenticator {
    Authenticator::new(AuthConfig {
        secret: SECRET.to_string(),
        ..AuthConfig::default()
    })
    .unwrap()
}

fn app(reply: &str) -> Router {
    let gw = gateway(
        ScriptedOracle::replying(reply),
        Arc::new(MemoryExecutor::default()),
    );
    create_rest_router(Arc::new(gw), authenticator(), &ServerConfig::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_search_wraps_envelope() {
    let app = app(r#"{"type":"DML","sql":"DELETE FROM student WHERE id = 4","message":"Removed."}"#);
    let response = app
        .oneshot(get("/ai/search?question=remove%20student%204"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["msg"], "success");
    assert_eq!(body["data"]["type"], "DML");
    assert_eq!(body["data"]["aiMessage"], "Removed.");
    assert_eq!(
        body["data"]["data"],
        "Operation Confirmed. Database Records Affected: 3"
    );
    assert!(body["data"].get("error").is_none());
}

#[tokio::test]
async fn test_oracle_garbage_still_returns_ok() {
    let app = app("not json at all {");
    let response = app.oneshot(get("/ai/search?question=hi")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["code"], 1);
    assert_eq!(body["data"]["type"], "CHAT");
    assert_eq!(body["data"]["data"], serde_json::json!([]));
}

#[tokio::test]
async fn test_protected_path_requires_token() {
    let app = app(r#"{"type":"CHAT","message":"hi"}"#);
    let response = app.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(bytes.is_empty());
}

#[tokio::test]
async fn test_protected_path_rejects_forged_token() {
    let forged = Authenticator::new(AuthConfig {
        secret: "someone-else".to_string(),
        ..AuthConfig::default()
    })
    .unwrap()
    .generate_token(1, "mallory")
    .unwrap();

    let request = Request::builder()
        .uri("/metrics")
        .header("token", forged)
        .body(Body::empty())
        .unwrap();
    let response = app(r#"{"type":"CHAT","message":"hi"}"#)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_path_accepts_issued_token() {
    let token = authenticator().generate_token(7, "registrar").unwrap();

    let request = Request::builder()
        .uri("/metrics")
        .header("token", token)
        .body(Body::empty())
        .unwrap();
    let response = app(r#"{"type":"CHAT","message":"hi"}"#)
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("nlq_questions_total"));
}

#[tokio::test]
async fn test_health_is_public() {
    let response = app(r#"{"type":"CHAT","message":"hi"}"#)
        .oneshot(get("/health"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}
