//! The ORD content surface: the `.well-known` configuration document and
//! the `/ord/v1/*` document/resource-file routes.

use axum::extract::{Path, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use super::state::AppState;
use crate::error::GatewayError;

pub async fn well_known(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.increment_documents_served();
    Json(state.processor.get_ord_configuration())
}

/// Single catch-all for `/ord/v1/*rest`, dispatching by the first path
/// segment the way spec.md §4.G's table distinguishes the three route
/// shapes sharing the same prefix.
pub async fn dispatch(State(state): State<AppState>, Path(rest): Path<String>) -> Response {
    let rest = rest.trim_start_matches('/');
    let mut segments = rest.splitn(2, '/');
    let Some(first) = segments.next().filter(|s| !s.is_empty()) else {
        return GatewayError::NotFound(rest.to_string()).into_response();
    };
    let remainder = segments.next();

    if first == ".well-known" {
        return GatewayError::NotFound(rest.to_string()).into_response();
    }

    if first == state.config.ord_documents_sub_directory {
        return serve_document(&state, rest).await;
    }

    match remainder {
        None => serve_root_file(&state, first).await,
        Some(path) => serve_resource_file(&state, first, path).await,
    }
}

async fn serve_document(state: &AppState, rel_path: &str) -> Response {
    let rel_path = if rel_path.ends_with(".json") {
        rel_path.to_string()
    } else {
        format!("{rel_path}.json")
    };

    match state.processor.get_processed_document(&rel_path) {
        Some(document) => {
            state.metrics.increment_documents_served();
            json_response(&state.repository.get_directory_hash("documents"), &rel_path, document)
        }
        None => GatewayError::NotFound(rel_path).into_response(),
    }
}

async fn serve_root_file(state: &AppState, file_name: &str) -> Response {
    if file_name == state.config.ord_documents_sub_directory || file_name == ".well-known" {
        return GatewayError::NotFound(file_name.to_string()).into_response();
    }
    if !state.repository.file_exists(file_name) {
        return GatewayError::NotFound(file_name.to_string()).into_response();
    }
    let Some(bytes) = state.repository.get_file_content(file_name) else {
        return GatewayError::NotFound(file_name.to_string()).into_response();
    };

    if file_name.ends_with(".json") {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                return json_response(&state.repository.get_directory_hash("documents"), file_name, value)
            }
            Err(_) => return GatewayError::ContentInvalid(file_name.to_string()).into_response(),
        }
    }

    raw_response(&state.repository.get_directory_hash("documents"), file_name, bytes)
}

/// Resolves a resource file under `<ordId>/...`: first via the FQN map
/// built from documents' `resourceDefinitions`, falling back to the
/// colon-to-underscore directory spec.md §9 describes.
async fn serve_resource_file(state: &AppState, ord_id: &str, path: &str) -> Response {
    if ord_id == state.config.ord_documents_sub_directory || ord_id == ".well-known" {
        return GatewayError::NotFound(format!("{ord_id}/{path}")).into_response();
    }

    let requested_name = path.rsplit('/').next().unwrap_or(path);
    let fqn_map = state.processor.get_fqn_map();

    let resolved_path = fqn_map
        .get(ord_id)
        .and_then(|entries| entries.iter().find(|entry| entry.file_name == requested_name))
        .map(|entry| entry.file_path.clone())
        .unwrap_or_else(|| format!("{}/{path}", ord_id.replace(':', "_")));

    let Some(bytes) = state.repository.get_file_content(&resolved_path) else {
        return GatewayError::NotFound(resolved_path).into_response();
    };

    let fingerprint = state.repository.get_directory_hash("documents");

    if resolved_path.ends_with(".json") {
        if let Ok(value) = serde_json::from_slice::<Value>(&bytes) {
            if value.get("openResourceDiscovery").is_some() {
                let processed = state.processor.process_ad_hoc_document(value);
                state.metrics.increment_documents_served();
                return json_response(&fingerprint, &resolved_path, processed);
            }
            return json_response(&fingerprint, &resolved_path, value);
        }
    }

    raw_response(&fingerprint, &resolved_path, bytes)
}

fn json_response(fingerprint: &str, path: &str, value: Value) -> Response {
    let mut response = Json(value).into_response();
    apply_content_headers(&mut response, fingerprint, path);
    response
}

fn raw_response(fingerprint: &str, path: &str, bytes: Vec<u8>) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();
    apply_content_headers(&mut response, fingerprint, path);
    response
}

fn apply_content_headers(response: &mut Response, fingerprint: &str, path: &str) {
    let etag = weak_etag(fingerprint, path);
    if let Ok(value) = HeaderValue::from_str(&etag) {
        response.headers_mut().insert(header::ETAG, value);
    }
}

fn weak_etag(fingerprint: &str, path: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    let path_hash = hasher.finish();
    let fingerprint_prefix: String = fingerprint.chars().take(8).collect();
    format!("W/\"{fingerprint_prefix}-{path_hash:x}\"")
}
