//! Callboard HTTP REST API
//!
//! Axum-based HTTP server exposing the dashboard analytics queries.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to an
//! inner function returning `(StatusCode, serde_json::Value)`. The inner
//! functions are directly testable without axum dispatch machinery.
//!
//! Endpoints:
//! - GET /health                    — health check with storage status
//! - GET /version                   — server version info
//! - GET /analytics                 — analytics across the caller's agents
//! - GET /analytics/agent/:agent_id — analytics for one agent + recent calls
//!
//! Analytics endpoints require the `x-user-id` header set by the upstream
//! auth layer.

use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use callboard_core::models::CallerContext;
use callboard_core::repository::SessionRepository;
use callboard_core::{CallboardConfig, CallboardError};
use chrono::Utc;
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::subsystems::analytics::{self, AnalyticsParams};

/// Header carrying the authenticated caller's user id.
pub const CALLER_HEADER: &str = "x-user-id";

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub repo: Arc<dyn SessionRepository>,
    pub config: CallboardConfig,
}

/// Build the Axum router with all endpoints
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/version", get(version_handler))
        .route("/analytics", get(analytics_handler))
        .route("/analytics/agent/:agent_id", get(agent_analytics_handler))
        .with_state(state)
}

/// Start the HTTP server on the configured address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    repo: Arc<dyn SessionRepository>,
    config: CallboardConfig,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let addr = format!("{}:{}", config.http.host, config.http.port);
    let state = Arc::new(HttpState { repo, config });

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Callboard HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Response envelopes
// ============================================================================

/// Standard HTTP error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
            field: None,
        }
    }
}

fn success_body<T: Serialize>(data: &T) -> (StatusCode, serde_json::Value) {
    match serde_json::to_value(data) {
        Ok(data) => (
            StatusCode::OK,
            serde_json::json!({ "success": true, "data": data }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize analytics response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_value(ErrorResponse::new("Internal server error")),
            )
        }
    }
}

fn error_value(body: ErrorResponse) -> serde_json::Value {
    serde_json::to_value(body).unwrap_or_else(|_| serde_json::json!({ "success": false }))
}

/// Map an internal error to a status code and a sanitized body.
///
/// Client errors carry their message; everything else is logged and reported generically.
pub fn error_to_http(err: &CallboardError) -> (StatusCode, serde_json::Value) {
    let status = match err {
        CallboardError::InvalidDate { .. }
        | CallboardError::InvalidRange { .. }
        | CallboardError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        CallboardError::AgentNotFound(_) => StatusCode::NOT_FOUND,
        CallboardError::Unauthenticated => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = if err.is_client_error() {
        ErrorResponse {
            success: false,
            error: err.to_string(),
            field: err.field(),
        }
    } else {
        tracing::error!(error = %err, "Analytics request failed");
        ErrorResponse::new("Internal server error")
    };

    (status, error_value(body))
}

/// Read the caller identity from request headers.
pub fn caller_from_headers(headers: &HeaderMap) -> Option<CallerContext> {
    headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| CallerContext::new(v))
}

/// Unwrap the query extractor, turning axum's plain-text rejection into a domain error.
pub fn params_from_query(
    query: std::result::Result<Query<AnalyticsParams>, QueryRejection>,
) -> std::result::Result<AnalyticsParams, CallboardError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| CallboardError::InvalidQuery(rejection.body_text()))
}

// ============================================================================
// Inner (directly testable) functions
// ============================================================================

/// Inner health check — probes storage and returns (status_code, json_body).
pub async fn health_inner(repo: &dyn SessionRepository) -> (StatusCode, serde_json::Value) {
    match repo.ping().await {
        Ok(backend) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "database": backend,
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                serde_json::json!({
                    "status": "unhealthy",
                    "error": "storage unavailable",
                }),
            )
        }
    }
}

/// Inner version — returns version info (pure, no IO).
pub fn version_inner() -> serde_json::Value {
    serde_json::json!({
        "version": env!("CARGO_PKG_VERSION"),
        "api": "callboard/1",
    })
}

/// Inner global analytics.
pub async fn analytics_inner(
    state: &HttpState,
    caller: Option<CallerContext>,
    params: AnalyticsParams,
) -> (StatusCode, serde_json::Value) {
    let Some(caller) = caller else {
        return error_to_http(&CallboardError::Unauthenticated);
    };

    let result = analytics::global_analytics(
        state.repo.as_ref(),
        &caller,
        &params,
        &state.config.analytics,
        Utc::now(),
    )
    .await;

    match result {
        Ok(report) => success_body(&report),
        Err(e) => error_to_http(&e),
    }
}

/// Inner per-agent analytics.
pub async fn agent_analytics_inner(
    state: &HttpState,
    caller: Option<CallerContext>,
    agent_id: &str,
    params: AnalyticsParams,
) -> (StatusCode, serde_json::Value) {
    let Some(caller) = caller else {
        return error_to_http(&CallboardError::Unauthenticated);
    };

    let result = analytics::agent_analytics(
        state.repo.as_ref(),
        &caller,
        agent_id,
        &params,
        &state.config.analytics,
        Utc::now(),
    )
    .await;

    match result {
        Ok(report) => success_body(&report),
        Err(e) => error_to_http(&e),
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(state.repo.as_ref()).await;
    (status, Json(body))
}

pub async fn version_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(version_inner()))
}

pub async fn analytics_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    query: std::result::Result<Query<AnalyticsParams>, QueryRejection>,
) -> impl IntoResponse {
    let (status, body) = match params_from_query(query) {
        Ok(params) => analytics_inner(&state, caller_from_headers(&headers), params).await,
        Err(e) => error_to_http(&e),
    };
    (status, Json(body))
}

pub async fn agent_analytics_handler(
    State(state): State<Arc<HttpState>>,
    headers: HeaderMap,
    Path(agent_id): Path<String>,
    query: std::result::Result<Query<AnalyticsParams>, QueryRejection>,
) -> impl IntoResponse {
    let (status, body) = match params_from_query(query) {
        Ok(params) => {
            agent_analytics_inner(&state, caller_from_headers(&headers), &agent_id, params).await
        }
        Err(e) => error_to_http(&e),
    };
    (status, Json(body))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use callboard_core::models::{Agent, Session, SessionStatus};
    use callboard_core::MemorySessionRepository;
    use chrono::{DateTime, Duration};
    use uuid::Uuid;

    fn test_config() -> CallboardConfig {
        CallboardConfig::from_toml_str(
            r#"
            [database]
            url = "postgresql://unused"
            max_connections = 1
            "#,
        )
        .expect("test config should parse")
    }

    fn session(status: SessionStatus, duration: u32, start: DateTime<Utc>) -> Session {
        Session {
            id: Uuid::new_v4(),
            agent_id: "agent-1".to_string(),
            customer_id: "cust".to_string(),
            session_type: "voice".to_string(),
            status,
            duration_seconds: duration,
            start_time: start,
            end_time: None,
            transcript: None,
            satisfaction: None,
        }
    }

    fn make_state() -> HttpState {
        let now = Utc::now();
        let repo = MemorySessionRepository::new(
            vec![Agent {
                id: "agent-1".to_string(),
                owner_id: "user-1".to_string(),
                name: "Receptionist".to_string(),
                description: Some("Main line".to_string()),
            }],
            vec![
                session(SessionStatus::Completed, 100, now - Duration::days(1)),
                session(SessionStatus::Failed, 0, now - Duration::days(2)),
            ],
        );
        HttpState {
            repo: Arc::new(repo),
            config: test_config(),
        }
    }

    fn caller() -> Option<CallerContext> {
        CallerContext::new("user-1")
    }

    // ========================================================================
    // TEST 1: version_inner is pure and returns correct fields
    // ========================================================================
    #[test]
    fn test_version_inner_pure() {
        let v = version_inner();
        assert!(v["version"].is_string(), "version must be string");
        assert_eq!(v["api"], "callboard/1");
    }

    // ========================================================================
    // TEST 2: error mapping — validation errors are 400 with field detail
    // ========================================================================
    #[test]
    fn test_error_to_http_invalid_date() {
        let err = CallboardError::InvalidDate {
            field: "date_to",
            value: "soon".to_string(),
        };
        let (status, body) = error_to_http(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["field"], "date_to");
        assert!(body["error"].as_str().unwrap().contains("soon"));
    }

    // ========================================================================
    // TEST 3: error mapping — unknown agent is 404
    // ========================================================================
    #[test]
    fn test_error_to_http_agent_not_found() {
        let (status, body) = error_to_http(&CallboardError::AgentNotFound("x".to_string()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.get("field").is_none());
    }

    // ========================================================================
    // TEST 4: error mapping — internal errors are sanitized
    // ========================================================================
    #[test]
    fn test_error_to_http_repository_sanitized() {
        let err = CallboardError::Repository(sqlx::Error::PoolTimedOut);
        let (status, body) = error_to_http(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    // ========================================================================
    // TEST 5: caller header parsing
    // ========================================================================
    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        assert!(caller_from_headers(&headers).is_none());

        headers.insert(CALLER_HEADER, HeaderValue::from_static("  "));
        assert!(caller_from_headers(&headers).is_none());

        headers.insert(CALLER_HEADER, HeaderValue::from_static("user-9"));
        assert_eq!(caller_from_headers(&headers).unwrap().user_id, "user-9");
    }

    // ========================================================================
    // TEST 6: analytics_inner — missing caller is 401
    // ========================================================================
    #[tokio::test]
    async fn test_analytics_inner_requires_caller() {
        let state = make_state();
        let (status, body) = analytics_inner(&state, None, AnalyticsParams::default()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
    }

    // ========================================================================
    // TEST 7: analytics_inner — default window returns envelope
    // ========================================================================
    #[tokio::test]
    async fn test_analytics_inner_ok() {
        let state = make_state();
        let (status, body) = analytics_inner(&state, caller(), AnalyticsParams::default()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["metrics"]["totalCalls"], 2);
        assert_eq!(body["data"]["metrics"]["successRate"], 50.0);
        assert!(body["data"]["dateRange"]["start"].is_string());
    }

    // ========================================================================
    // TEST 8: analytics_inner — malformed date is 400
    // ========================================================================
    #[tokio::test]
    async fn test_analytics_inner_malformed_date() {
        let state = make_state();
        let params = AnalyticsParams {
            date_from: Some("not-a-date".to_string()),
            ..Default::default()
        };
        let (status, body) = analytics_inner(&state, caller(), params).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "date_from");
    }

    // ========================================================================
    // TEST 9: agent_analytics_inner — unknown agent is 404
    // ========================================================================
    #[tokio::test]
    async fn test_agent_analytics_inner_unknown() {
        let state = make_state();
        let (status, body) =
            agent_analytics_inner(&state, caller(), "unknown-id", AnalyticsParams::default()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
        assert!(body.get("data").is_none());
    }

    // ========================================================================
    // TEST 10: error mapping — undeserializable query string is 400
    // ========================================================================
    #[test]
    fn test_error_to_http_invalid_query() {
        let err = CallboardError::InvalidQuery("duplicate field `date_from`".to_string());
        let (status, body) = error_to_http(&err);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("date_from"));
        assert!(body.get("field").is_none());
    }

    // ========================================================================
    // TEST 11: health_inner — in-memory storage is healthy
    // ========================================================================
    #[tokio::test]
    async fn test_health_inner_ok() {
        let state = make_state();
        let (status, body) = health_inner(state.repo.as_ref()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }
}
