//! GitHub webhook receiver: verifies the HMAC signature over the raw body,
//! then triggers the scheduler for `push` events on the tracked branch.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use super::state::AppState;
use crate::auth::crypto::verify_hmac_sha256;
use crate::observability::{AuditAction, AuditRecord};

#[derive(Debug, Deserialize)]
struct PushPayload {
    #[serde(rename = "ref")]
    git_ref: Option<String>,
}

pub async fn receive(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    state.metrics.increment_webhooks_received();

    if let Some(secret) = state.config.webhook_secret.as_deref() {
        let signature = headers
            .get("x-hub-signature-256")
            .and_then(|v| v.to_str().ok());
        let Some(signature) = signature else {
            return reject(&state, "missing signature header");
        };
        if !verify_hmac_sha256(secret.as_bytes(), &body, signature) {
            return reject(&state, "signature mismatch");
        }
    }

    let event_type = headers
        .get("x-github-event")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if event_type == "ping" {
        return (StatusCode::OK, Json(json!({"status": "ok"}))).into_response();
    }

    let payload: PushPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(_) => PushPayload { git_ref: None },
    };

    let expected_ref = format!("refs/heads/{}", state.config.github_branch.as_deref().unwrap_or(""));
    if event_type == "push" && payload.git_ref.as_deref() != Some(expected_ref.as_str()) {
        return (StatusCode::OK, Json(json!({"status": "ignored"}))).into_response();
    }

    let manual_trigger = headers
        .get("x-manual-trigger")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if manual_trigger {
        state
            .scheduler
            .schedule(Duration::from_millis(state.config.update_delay_ms))
            .await;
    } else {
        state.scheduler.schedule_immediate().await;
    }

    (StatusCode::OK, Json(json!({"status": "scheduled"}))).into_response()
}

fn reject(state: &AppState, detail: &str) -> axum::response::Response {
    state.metrics.increment_webhooks_rejected();
    if let Some(audit) = &state.audit {
        audit.record(AuditRecord::new(AuditAction::WebhookRejected).with_detail(detail));
    }
    (StatusCode::UNAUTHORIZED, Json(json!({"error": {"code": "UNAUTHORIZED", "message": detail}}))).into_response()
}
