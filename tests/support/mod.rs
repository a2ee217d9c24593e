//! Shared fixture builder for the HTTP router integration tests.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ord_gateway::auth::AuthPipeline;
use ord_gateway::config::{AuthenticationConfig, GatewayConfig, SourceType};
use ord_gateway::fetcher::{ContentFetcher, FetchError, FetchResult, ProgressCallback};
use ord_gateway::http::AppState;
use ord_gateway::observability::MetricsRegistry;
use ord_gateway::processor::DocumentProcessor;
use ord_gateway::repository::{DocumentRepository, FingerprintSource};
use ord_gateway::scheduler::UpdateScheduler;
use ord_gateway::snapshot::{ContentMetadata, SnapshotManager};
use ord_gateway::status::StatusService;

pub struct NoopFetcher;

#[async_trait]
impl ContentFetcher for NoopFetcher {
    async fn fetch_all_content(
        &self,
        _target_dir: &Path,
        _progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata> {
        Err(FetchError::NotFound("not found".to_string()))
    }

    async fn fetch_latest_changes(
        &self,
        _target_dir: &Path,
        _since: &str,
        _progress: ProgressCallback,
    ) -> FetchResult<ContentMetadata> {
        Err(FetchError::NotFound("not found".to_string()))
    }

    fn abort_fetch(&self) {}

    async fn get_latest_commit_sha(&self) -> FetchResult<String> {
        Err(FetchError::NotFound("not found".to_string()))
    }
}

/// Assembles an `AppState` backed by a local-source fixture directory,
/// with the given authentication configuration.
pub fn build_state(dir: &Path, authentication: AuthenticationConfig) -> AppState {
    let config = Arc::new(GatewayConfig {
        source_type: SourceType::Local,
        ord_directory: dir.to_path_buf(),
        ord_documents_sub_directory: "documents".to_string(),
        base_url: "https://gateway.example.com".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        github_api_url: None,
        github_repository: None,
        github_branch: None,
        github_token: None,
        webhook_secret: Some("topsecret".to_string()),
        update_delay_ms: 1000,
        data_dir: dir.to_path_buf(),
        authentication,
        status_dashboard_enabled: true,
        include_build_number: false,
    });

    let repository = Arc::new(DocumentRepository::new(dir.to_path_buf(), FingerprintSource::Local));
    let processor = Arc::new(DocumentProcessor::new(
        Arc::clone(&repository),
        config.base_url.clone(),
        config.authentication.methods.clone(),
    ));
    let metrics = Arc::new(MetricsRegistry::new());
    let snapshot = Arc::new(SnapshotManager::new(dir.to_path_buf(), "documents"));
    let scheduler = UpdateScheduler::new(
        Arc::clone(&snapshot),
        Arc::new(NoopFetcher) as Arc<dyn ContentFetcher>,
        Arc::clone(&processor),
        Arc::clone(&metrics),
        None,
        Duration::from_millis(config.update_delay_ms),
    );
    let status = Arc::new(StatusService::new(
        Arc::clone(&config),
        Arc::clone(&scheduler),
        Arc::clone(&snapshot),
        Arc::clone(&metrics),
    ));

    AppState {
        auth: Arc::new(AuthPipeline::new(&config.authentication)),
        config,
        repository,
        processor,
        scheduler,
        snapshot,
        metrics,
        audit: None,
        status,
    }
}

pub fn write_document(dir: &Path, name: &str, contents: serde_json::Value) {
    let documents = dir.join("documents");
    std::fs::create_dir_all(&documents).unwrap();
    std::fs::write(documents.join(name), contents.to_string()).unwrap();
}
