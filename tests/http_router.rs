//! End-to-end checks of the assembled router: auth gating, the
//! `.well-known` bypass, document serving, and webhook verification.

mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::Engine;
use hmac::{Hmac, Mac};
use ord_gateway::auth::crypto::hash_bcrypt;
use ord_gateway::config::{AuthMethod, AuthenticationConfig};
use ord_gateway::http::HttpServer;
use serde_json::json;
use sha2::Sha256;
use tempfile::TempDir;
use tower::ServiceExt;

fn open_auth() -> AuthenticationConfig {
    AuthenticationConfig {
        methods: vec![AuthMethod::Open],
        basic_auth_users: Default::default(),
        sap_cf_mtls: Default::default(),
    }
}

fn basic_auth(username: &str, password: &str) -> AuthenticationConfig {
    let mut users = std::collections::HashMap::new();
    users.insert(username.to_string(), hash_bcrypt(password).unwrap());
    AuthenticationConfig {
        methods: vec![AuthMethod::Basic],
        basic_auth_users: users,
        sap_cf_mtls: Default::default(),
    }
}

fn basic_header(username: &str, password: &str) -> String {
    let raw = format!("{username}:{password}");
    format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
}

#[tokio::test]
async fn well_known_bypasses_auth_even_when_basic_is_required() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), basic_auth("alice", "hunter2"));
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/.well-known/open-resource-discovery")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_route_rejects_missing_credentials() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), basic_auth("alice", "hunter2"));
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_route_accepts_valid_basic_credentials() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), basic_auth("alice", "hunter2"));
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("authorization", basic_header("alice", "hunter2"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn every_response_carries_the_server_version_header() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-ord-provider-server-version"));
}

#[tokio::test]
async fn document_route_serves_a_processed_ord_document() {
    let dir = TempDir::new().unwrap();
    support::write_document(
        dir.path(),
        "a.json",
        json!({"openResourceDiscovery": "1.9"}),
    );
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/ord/v1/documents/a.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["describedSystemInstance"]["baseUrl"], "https://gateway.example.com");
}

#[tokio::test]
async fn document_route_404s_for_unknown_document() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/ord/v1/documents/missing.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn webhook_rejects_an_invalid_signature() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let body = r#"{"ref":"refs/heads/main"}"#;
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/webhook/github")
                .header("x-github-event", "push")
                .header("x-hub-signature-256", "sha256=deadbeef")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_accepts_a_valid_signature_for_a_ping_event() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let body = r#"{"zen":"hello"}"#;
    let mut mac = Hmac::<Sha256>::new_from_slice(b"topsecret").unwrap();
    mac.update(body.as_bytes());
    let signature = format!("sha256={}", hex::encode(mac.finalize().into_bytes()));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/webhook/github")
                .header("x-github-event", "ping")
                .header("x-hub-signature-256", signature)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_endpoint_reports_scheduler_state() {
    let dir = TempDir::new().unwrap();
    let state = support::build_state(dir.path(), open_auth());
    let router = HttpServer::new(state).router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
