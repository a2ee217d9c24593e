//! Shared application state handed to every Axum handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthPipeline;
use crate::config::GatewayConfig;
use crate::observability::{AuditLog, MetricsRegistry};
use crate::processor::DocumentProcessor;
use crate::repository::DocumentRepository;
use crate::scheduler::UpdateScheduler;
use crate::snapshot::SnapshotManager;
use crate::status::StatusService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub repository: Arc<DocumentRepository>,
    pub processor: Arc<DocumentProcessor>,
    pub scheduler: Arc<UpdateScheduler>,
    pub snapshot: Arc<SnapshotManager>,
    pub auth: Arc<AuthPipeline>,
    pub metrics: Arc<MetricsRegistry>,
    pub audit: Option<Arc<AuditLog>>,
    pub status: Arc<StatusService>,
}

impl FromRef<AppState> for Arc<StatusService> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(&state.status)
    }
}
