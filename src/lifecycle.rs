//! Startup warmup and graceful shutdown (spec.md §4.J).
//!
//! Startup materialises a snapshot manager, does a mandatory initial fetch
//! for a remote source with no `current/` content, performs an opportunistic
//! staleness check otherwise, then hands off to the HTTP server. Shutdown
//! cancels any in-flight fetch and waits for the push channel to drain its
//! close frames via Axum's graceful-shutdown future.

use std::sync::Arc;
use std::time::Duration;

use crate::auth::AuthPipeline;
use crate::config::{GatewayConfig, SourceType};
use crate::fetcher::{ContentFetcher, GitFetcher};
use crate::http::{AppState, HttpServer};
use crate::observability::{log_event, AuditLog, Event, Logger, MetricsRegistry, ObservationScope};
use crate::processor::DocumentProcessor;
use crate::repository::{DocumentRepository, FingerprintSource};
use crate::scheduler::UpdateScheduler;
use crate::snapshot::SnapshotManager;
use crate::status::StatusService;

/// Process exit codes per spec.md §4.J.
pub const EXIT_GRACEFUL: i32 = 0;
pub const EXIT_BIND_FAILED: i32 = 1;
pub const EXIT_INITIAL_FETCH_FAILED: i32 = 1;

pub async fn run(config: GatewayConfig) -> i32 {
    log_event(Event::BootStart);
    let config = Arc::new(config);
    check_base_url_scheme(&config);

    let state = match build_state(Arc::clone(&config)).await {
        Ok(state) => state,
        Err(()) => return EXIT_INITIAL_FETCH_FAILED,
    };

    let scheduler = Arc::clone(&state.scheduler);
    log_event(Event::BootComplete);

    let server = HttpServer::new(state);
    match server.start(shutdown_signal()).await {
        Ok(()) => {
            log_event(Event::ShutdownStart);
            scheduler.abort_in_flight().await;
            log_event(Event::ShutdownComplete);
            EXIT_GRACEFUL
        }
        Err(err) => {
            Logger::error("http_listener_bind_failed", &[("error", &err.to_string())]);
            EXIT_BIND_FAILED
        }
    }
}

async fn build_state(config: Arc<GatewayConfig>) -> Result<AppState, ()> {
    let snapshot = Arc::new(SnapshotManager::new(
        config.data_dir.clone(),
        config.ord_documents_sub_directory.clone(),
    ));

    let (repository_root, fingerprint_source, fetcher): (
        std::path::PathBuf,
        FingerprintSource,
        Arc<dyn ContentFetcher>,
    ) = match config.source_type {
        SourceType::Local => (
            config.ord_directory.clone(),
            FingerprintSource::Local,
            Arc::new(NullFetcher) as Arc<dyn ContentFetcher>,
        ),
        SourceType::Github => {
            if snapshot.initialize().is_err() {
                Logger::error("snapshot_init_failed", &[]);
                return Err(());
            }
            let fetcher: Arc<dyn ContentFetcher> = Arc::new(GitFetcher::new(
                format!(
                    "https://github.com/{}.git",
                    config.github_repository.clone().unwrap_or_default()
                ),
                config.github_repository.clone().unwrap_or_default(),
                config.github_branch.clone().unwrap_or_else(|| "main".to_string()),
                config.github_token.clone(),
            ));
            if !snapshot.has_current_content() {
                let scope = ObservationScope::new("BOOT_FETCH");
                if let Err(err) = initial_fetch(&snapshot, &fetcher).await {
                    // there is no content to serve without this fetch, so the
                    // process exits rather than starting with an empty gateway.
                    scope.fail_fatal(&err.to_string());
                    return Err(());
                }
                scope.complete();
            }
            (snapshot.current_path(), FingerprintSource::Snapshot(Arc::clone(&snapshot)), fetcher)
        }
    };

    let repository = Arc::new(DocumentRepository::new(repository_root, fingerprint_source));
    let processor = Arc::new(DocumentProcessor::new(
        Arc::clone(&repository),
        config.base_url.clone(),
        config.authentication.methods.clone(),
    ));

    let audit = AuditLog::open(&config.data_dir.join("audit.log"))
        .ok()
        .map(Arc::new);

    let metrics = Arc::new(MetricsRegistry::new());

    let scheduler = UpdateScheduler::new(
        Arc::clone(&snapshot),
        Arc::clone(&fetcher),
        Arc::clone(&processor),
        Arc::clone(&metrics),
        audit.clone(),
        Duration::from_millis(config.update_delay_ms),
    );
    scheduler.initialize().await;

    if config.source_type == SourceType::Github {
        if let Ok(true) = scheduler.check_for_updates().await {
            scheduler.schedule(Duration::from_millis(config.update_delay_ms)).await;
        }
    }

    let mut auth = AuthPipeline::new(&config.authentication);
    if config.authentication.sap_cf_mtls.enabled && !config.authentication.sap_cf_mtls.config_endpoints.is_empty() {
        let discovered = crate::auth::trusted_dn::discover(&config.authentication.sap_cf_mtls.config_endpoints).await;
        auth.extend_trusted_dns(discovered.issuers, discovered.subjects);
    }

    let status = Arc::new(StatusService::new(
        Arc::clone(&config),
        Arc::clone(&scheduler),
        Arc::clone(&snapshot),
        Arc::clone(&metrics),
    ));

    Ok(AppState {
        config,
        repository,
        processor,
        scheduler,
        snapshot,
        auth: Arc::new(auth),
        metrics,
        audit,
        status,
    })
}

async fn initial_fetch(
    snapshot: &SnapshotManager,
    fetcher: &Arc<dyn ContentFetcher>,
) -> Result<(), crate::error::GatewayError> {
    let staging = snapshot.staging_directory()?;
    let progress: crate::fetcher::ProgressCallback = Box::new(|_| {});
    let metadata = fetcher.fetch_all_content(&staging, progress).await?;
    if !snapshot.validate(&staging) {
        return Err(crate::error::GatewayError::ContentInvalid(
            "initial fetch produced no documents subdirectory".to_string(),
        ));
    }
    let now_millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    snapshot.swap(&staging, now_millis)?;
    snapshot.save_metadata(&metadata);
    Ok(())
}

fn check_base_url_scheme(config: &GatewayConfig) {
    let https_listener = false; // the gateway always listens plaintext behind a reverse proxy
    if config.base_url.starts_with("https://") && !https_listener {
        Logger::warn(
            "base_url_scheme_mismatch",
            &[("base_url", &config.base_url), ("listener", "http")],
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

struct NullFetcher;

#[async_trait::async_trait]
impl ContentFetcher for NullFetcher {
    async fn fetch_all_content(
        &self,
        _target_dir: &std::path::Path,
        _progress: crate::fetcher::ProgressCallback,
    ) -> crate::fetcher::FetchResult<crate::snapshot::ContentMetadata> {
        Err(crate::fetcher::FetchError::NotFound("not found".to_string()))
    }

    async fn fetch_latest_changes(
        &self,
        target_dir: &std::path::Path,
        _since: &str,
        progress: crate::fetcher::ProgressCallback,
    ) -> crate::fetcher::FetchResult<crate::snapshot::ContentMetadata> {
        self.fetch_all_content(target_dir, progress).await
    }

    fn abort_fetch(&self) {}

    async fn get_latest_commit_sha(&self) -> crate::fetcher::FetchResult<String> {
        Err(crate::fetcher::FetchError::NotFound("not found".to_string()))
    }
}
