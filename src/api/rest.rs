//! HTTP router.

use std::sync::Arc;

use axum::{
    http::{header, HeaderName, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{handle_panic, health_handler, metrics_handler, search_handler, ApiState};
use crate::auth::{AuthLayer, Authenticator};
use crate::config::ServerConfig;
use crate::gateway::Gateway;

/// Create the HTTP router.
///
/// Endpoints:
/// - GET /ai/search?question=...  - Answer a question
/// - GET /health                  - Database reachability
/// - GET /metrics                 - Prometheus metrics
pub fn create_rest_router(
    gateway: Arc<Gateway>,
    authenticator: Authenticator,
    config: &ServerConfig,
) -> Router {
    let state = Arc::new(ApiState::new(gateway));
    let cors = cors_layer(config, authenticator.header_name());

    Router::new()
        .route("/ai/search", get(search_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
        .layer(AuthLayer::new(authenticator))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

fn cors_layer(config: &ServerConfig, token_header: &str) -> CorsLayer {
    let mut headers = vec![header::CONTENT_TYPE, header::AUTHORIZATION];
    match HeaderName::from_bytes(token_header.as_bytes()) {
        Ok(name) => headers.push(name),
        Err(e) => tracing::warn!(header = token_header, error = %e, "Invalid token header name"),
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(headers);

    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::error::{ExecutionError, OracleError};
    use crate::gateway::IntentRouter;
    use crate::intent::ResponseInterpreter;
    use crate::oracle::Oracle;
    use crate::prompt::{CompiledPrompt, PromptCompiler};
    use crate::store::{QueryExecutor, Row, StatementGuard};
    use async_trait::async_trait;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    struct GreetingOracle;

    #[async_trait]
    impl Oracle for GreetingOracle {
        async fn complete(&self, _prompt: &CompiledPrompt) -> Result<String, OracleError> {
            Ok(r#"{"type":"CHAT","sql":null,"message":"Hello! Ask me about students."}"#.to_string())
        }

        fn name(&self) -> &str {
            "greeting"
        }
    }

    struct DownExecutor;

    #[async_trait]
    impl QueryExecutor for DownExecutor {
        async fn execute_read(&self, _statement: &str) -> Result<Vec<Row>, ExecutionError> {
            Err(ExecutionError::Connection("down".to_string()))
        }

        async fn execute_write(&self, _statement: &str) -> Result<u64, ExecutionError> {
            Err(ExecutionError::Connection("down".to_string()))
        }

        async fn ping(&self) -> Result<(), ExecutionError> {
            Err(ExecutionError::Connection("down".to_string()))
        }
    }

    fn router() -> Router {
        let gateway = Gateway::new(
            PromptCompiler::default(),
            Arc::new(GreetingOracle),
            ResponseInterpreter::new(),
            IntentRouter::new(Arc::new(DownExecutor), StatementGuard::default()),
        );
        let auth = Authenticator::new(AuthConfig {
            secret: "rest-secret".to_string(),
            ..AuthConfig::default()
        })
        .unwrap();
        create_rest_router(Arc::new(gateway), auth, &ServerConfig::default())
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_without_token() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/ai/search?question=hello%20there")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["code"], 1);
        assert_eq!(body["msg"], "success");
        assert_eq!(body["data"]["type"], "CHAT");
        assert_eq!(body["data"]["aiMessage"], "Hello! Ask me about students.");
        assert_eq!(body["data"]["data"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_search_missing_question() {
        let response = router()
            .oneshot(Request::builder().uri("/ai/search").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["msg"], "Missing required parameter: question");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_health_reports_database_down() {
        let response = router()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["checks"].as_array().unwrap().len(), 1);
        assert_eq!(body["checks"][0]["name"], "database");
        assert_eq!(body["checks"][0]["message"], "database unreachable");
        assert!(!body.to_string().contains("down"));
    }

    #[tokio::test]
    async fn test_search_repeated_question_still_answers() {
        let response = router()
            .oneshot(
                Request::builder()
                    .uri("/ai/search?question=a&question=b")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["code"], 0);
        assert_eq!(body["msg"], "Invalid request parameters");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn test_metrics_requires_token() {
        let response = router()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
