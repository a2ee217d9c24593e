//! HTTP server: the ORD gateway's route table and its startup/shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::dashboard;
use super::health;
use super::middleware::{access_log, require_auth, server_version_header};
use super::ord_routes;
use super::state::AppState;
use super::webhook;
use crate::config::GatewayConfig;
use crate::observability::Logger;
use crate::status::websocket as status_ws;

pub struct HttpServer {
    config: Arc<GatewayConfig>,
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState) -> Self {
        let config = Arc::clone(&state.config);
        let router = Self::build_router(state);
        Self { config, router }
    }

    fn build_router(state: AppState) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/.well-known/open-resource-discovery", get(ord_routes::well_known))
            .route("/ord/v1/*rest", get(ord_routes::dispatch))
            .route("/health", get(health::health))
            .route("/api/v1/status", get(status_handler))
            .route("/status", get(dashboard::show))
            .route("/api/v1/webhook/github", post(webhook::receive))
            .route("/ws", get(status_ws::upgrade))
            .layer(axum::middleware::from_fn(server_version_header))
            .layer(axum::middleware::from_fn_with_state(state.clone(), require_auth))
            .layer(axum::middleware::from_fn_with_state(state.clone(), access_log))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(state)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    pub fn router(self) -> Router {
        self.router
    }

    /// Runs until `shutdown` resolves, then lets in-flight requests drain.
    pub async fn start(self, shutdown: impl std::future::Future<Output = ()> + Send + 'static) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self
            .config
            .socket_addr()
            .parse()
            .expect("invalid socket address");

        Logger::info("http_server_binding", &[("addr", &addr.to_string())]);
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

async fn status_handler(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> axum::Json<crate::status::StatusResponse> {
    axum::Json(state.status.build().await)
}
