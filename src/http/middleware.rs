//! Request-scoped HTTP middleware: auth gating and structured access logging.
//!
//! The `.well-known` configuration endpoint bypasses auth by design; every
//! other route goes through the configured auth pipeline.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::state::AppState;
use crate::auth::AuthDecision;
use crate::observability::{AuditAction, AuditRecord, Logger};

const UNAUTHENTICATED_PATH_PREFIX: &str = "/.well-known";

pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if request.uri().path().starts_with(UNAUTHENTICATED_PATH_PREFIX) {
        return next.run(request).await;
    }

    match state.auth.authenticate(request.headers()) {
        Ok(AuthDecision::Open) | Ok(AuthDecision::Basic) | Ok(AuthDecision::Mtls) => {
            if let Some(audit) = &state.audit {
                audit.record(AuditRecord::new(AuditAction::AuthAccepted));
            }
            next.run(request).await
        }
        Ok(AuthDecision::MtlsExpiredWindow { subject }) => {
            if let Some(audit) = &state.audit {
                audit.record(
                    AuditRecord::new(AuditAction::MtlsCertWindowMismatch).with_detail(subject),
                );
            }
            next.run(request).await
        }
        Err(err) => {
            state.metrics.increment_auth_rejections();
            if let Some(audit) = &state.audit {
                audit.record(AuditRecord::new(AuditAction::AuthRejected).with_detail(err.to_string()));
            }
            let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
            (status, axum::Json(json!({"error": {"code": "UNAUTHORIZED", "message": err.to_string()}})))
                .into_response()
        }
    }
}

/// Logs one line per request: method, path, status, and latency.
pub async fn access_log(State(state): State<AppState>, request: Request, next: Next) -> Response {
    state.metrics.increment_requests();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    if status.is_server_error() || status.is_client_error() {
        state.metrics.increment_requests_failed();
    }
    let latency_ms = started.elapsed().as_millis().to_string();
    let status_str = status.as_u16().to_string();
    Logger::info(
        "http_request",
        &[
            ("method", &method),
            ("path", &path),
            ("status", &status_str),
            ("latency_ms", &latency_ms),
        ],
    );

    response
}

/// Stamps every response with the gateway's own version, per spec.md §6.
pub async fn server_version_header(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    if let Ok(value) = axum::http::HeaderValue::from_str(env!("CARGO_PKG_VERSION")) {
        response
            .headers_mut()
            .insert("x-ord-provider-server-version", value);
    }
    response
}
