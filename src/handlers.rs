use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ThrottlerError, ThrottlerResult};
use crate::health::HealthChecker;
use crate::metrics::MetricsCollector;
use crate::response::{ConfigResponse, MetricsResponse, ThrottleResponse};
use crate::throttler::Throttler;
use crate::validation::RequestValidator;

/// Shared application state
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub throttler: Throttler,
    pub metrics: MetricsCollector,
    pub health: HealthChecker,
}

impl AppState {
    pub fn new(throttler: Throttler) -> SharedState {
        Arc::new(Self {
            health: HealthChecker::new(throttler.clone()),
            metrics: MetricsCollector::new(),
            throttler,
        })
    }
}

fn parse_body(body: &Bytes) -> ThrottlerResult<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body)
        .map_err(|e| ThrottlerError::Validation(format!("Invalid JSON body: {}", e)))
}

/// Take a token from the bucket of `key`
pub async fn throttle_key(
    State(state): State<SharedState>,
    Path(key): Path<String>,
    body: Bytes,
) -> ThrottlerResult<Response> {
    RequestValidator::validate_key(&key)?;
    let options = RequestValidator::parse_options(&parse_body(&body)?)?;

    let outcome = match state.throttler.check(&key, options).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.metrics.record_error(&key).await;
            return Err(e);
        }
    };
    state.metrics.record_outcome(&key, &outcome).await;

    let payload = ThrottleResponse::from_outcome(key, &outcome);
    let allowed = payload.allowed;
    let mut resp = Json(payload).into_response();

    let headers = resp.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(outcome.limit));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(outcome.tokens));

    if !allowed {
        *resp.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        let retry_after = outcome.resets_in.as_millis().div_ceil(1000) as u64;
        resp.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));
    }

    Ok(resp)
}

/// Counters for a single key
pub async fn key_metrics(
    State(state): State<SharedState>,
    Path(key): Path<String>,
) -> ThrottlerResult<Response> {
    RequestValidator::validate_key(&key)?;

    match state.metrics.get_key_metrics(&key).await {
        Some(metrics) => Ok(Json(metrics).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "key": key, "error": "no requests recorded" })),
        )
            .into_response()),
    }
}

pub async fn global_metrics(State(state): State<SharedState>) -> impl IntoResponse {
    Json(MetricsResponse {
        tracked_keys: state.metrics.tracked_keys().await,
        global: state.metrics.get_global_metrics().await,
    })
}

pub async fn current_config(State(state): State<SharedState>) -> impl IntoResponse {
    Json(ConfigResponse::current(&state.throttler))
}

/// Health check endpoint
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let status = state.health.check_health().await;
    let code = if status.status == "healthy" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<SharedState>) -> impl IntoResponse {
    let store = state.throttler.store();
    match store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready",
                "store": store.name(),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "store": store.name(),
                "error": e.to_string(),
            })),
        ),
    }
}
