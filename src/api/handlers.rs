//! HTTP request handlers.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::gateway::{Gateway, ResultEnvelope};
use crate::metrics::{get_metrics, HealthCheck, HealthStatus};

/// Message returned when a handler panics. Details stay in the logs.
pub const PANIC_MESSAGE: &str = "System error. Please contact the administrator.";

/// Application state shared across handlers.
pub struct ApiState {
    pub gateway: Arc<Gateway>,
}

impl ApiState {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Uniform response wrapper: `code` 1 on success, 0 on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResult<T> {
    pub code: u8,
    pub msg: String,
    pub data: Option<T>,
}

impl<T> ApiResult<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: 1,
            msg: "success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            code: 0,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Query parameters for `/ai/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub question: Option<String>,
}

// ============================================================================
// Handler Functions
// ============================================================================

/// GET /ai/search - Answer a natural-language question.
pub async fn search_handler(
    State(state): State<Arc<ApiState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Json<ApiResult<ResultEnvelope>> {
    let params = match params {
        Ok(Query(params)) => params,
        Err(e) => {
            tracing::warn!(error = %e, "Search request with unreadable query string");
            return Json(ApiResult::error("Invalid request parameters"));
        }
    };
    let Some(question) = params.question else {
        tracing::warn!("Search request without a question");
        return Json(ApiResult::error("Missing required parameter: question"));
    };

    let envelope = state.gateway.ask(&question).await;
    Json(ApiResult::success(envelope))
}

/// GET /health - Report database reachability. The endpoint is public, so
/// failure detail goes to the log only.
pub async fn health_handler(State(state): State<Arc<ApiState>>) -> impl IntoResponse {
    let start = Instant::now();
    let database = match state.gateway.ping_database().await {
        Ok(()) => HealthCheck::healthy_with_duration("database", start.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            HealthCheck::unhealthy("database", "database unreachable")
        }
    };

    let status = HealthStatus::from_checks(vec![database]);
    let code = StatusCode::from_u16(status.status.to_status_code())
        .unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
    (code, Json(status))
}

/// GET /metrics - Prometheus text exposition.
pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        get_metrics().export_prometheus(),
    )
}

/// Turn a handler panic into the generic failure result.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "Handler panicked");

    Json(ApiResult::<()>::error(PANIC_MESSAGE)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_result_wire_format() {
        let ok = serde_json::to_value(ApiResult::success(json!({"type": "CHAT"}))).unwrap();
        assert_eq!(ok, json!({"code": 1, "msg": "success", "data": {"type": "CHAT"}}));

        let err = serde_json::to_value(ApiResult::<()>::error("nope")).unwrap();
        assert_eq!(err, json!({"code": 0, "msg": "nope", "data": null}));
    }

    #[tokio::test]
    async fn test_handle_panic() {
        let response = handle_panic(Box::new("index out of bounds"));
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["code"], 0);
        assert_eq!(value["msg"], PANIC_MESSAGE);
        assert!(!body.windows(5).any(|w| w == b"index"));
    }
}
