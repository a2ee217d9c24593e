//! `/status` dashboard: a thin HTML shell that polls `/api/v1/status` and
//! the `/ws` push channel. The actual dashboard assets are out of scope;
//! this handler only owns the enabled/disabled interface contract.

use axum::extract::State;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use super::state::AppState;

const SHELL: &str = r#"<!doctype html>
<html><head><title>ORD Gateway Status</title></head>
<body>
<div id="status">loading…</div>
<script>
fetch('/api/v1/status').then(r => r.json()).then(data => {
  document.getElementById('status').textContent = JSON.stringify(data, null, 2);
});
</script>
</body></html>"#;

pub async fn show(State(state): State<AppState>) -> Response {
    if !state.config.status_dashboard_enabled {
        return Redirect::to("/.well-known/open-resource-discovery").into_response();
    }

    let mut response = (StatusCode::OK, SHELL).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    response
}
