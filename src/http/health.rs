//! Liveness check: always 200 once the process is accepting connections.
//! Readiness is covered by the richer `/api/v1/status`.

use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now(),
    }))
}
