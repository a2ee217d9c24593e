//! Status aggregation: the `/api/v1/status` payload and the version-info
//! registry lookup backing it.

pub mod websocket;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::{AuthMethod, GatewayConfig, SourceType};
use crate::observability::{MetricsRegistry, MetricsSnapshot, SystemMetrics};
use crate::scheduler::{SchedulerState, UpdateScheduler};
use crate::snapshot::{ContentMetadata, SnapshotManager};

const REGISTRY_LOOKUP_TIMEOUT: Duration = Duration::from_secs(2);
const REGISTRY_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub current: String,
    pub latest: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsEcho {
    pub source_type: SourceType,
    pub base_url: String,
    pub directory_display: String,
    pub auth_methods: Vec<AuthMethod>,
    pub github_repository: Option<String>,
    pub github_branch: Option<String>,
    pub update_delay_ms: u64,
    pub startup_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub server_version: String,
    pub version_info: VersionInfo,
    pub scheduler: SchedulerState,
    pub snapshot: Option<ContentMetadata>,
    pub settings: SettingsEcho,
    pub system_metrics: SystemMetrics,
    pub request_metrics: MetricsSnapshot,
}

struct VersionCache {
    fetched_at: Instant,
    latest: Option<String>,
}

/// Aggregates scheduler, snapshot, and system state into `StatusResponse`.
///
/// Grounded on the version-info lookup needing an external registry: for a
/// `github`-sourced gateway, "latest" is read from the configured GitHub
/// API's releases endpoint for the same repository; for a `local` source
/// there is nothing to check against, so `latest` is always `None`.
pub struct StatusService {
    config: Arc<GatewayConfig>,
    scheduler: Arc<UpdateScheduler>,
    snapshot: Arc<SnapshotManager>,
    metrics: Arc<MetricsRegistry>,
    started_at: DateTime<Utc>,
    version_cache: Mutex<Option<VersionCache>>,
    http: reqwest::Client,
}

impl StatusService {
    pub fn new(
        config: Arc<GatewayConfig>,
        scheduler: Arc<UpdateScheduler>,
        snapshot: Arc<SnapshotManager>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REGISTRY_LOOKUP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            config,
            scheduler,
            snapshot,
            metrics,
            started_at: Utc::now(),
            version_cache: Mutex::new(None),
            http,
        }
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<crate::scheduler::SchedulerEvent> {
        self.scheduler.subscribe()
    }

    pub async fn build(&self) -> StatusResponse {
        let scheduler_state = self.scheduler.state().await;
        let snapshot_metadata = self.snapshot.load_metadata();
        let latest = self.latest_version().await;

        StatusResponse {
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            version_info: VersionInfo {
                current: env!("CARGO_PKG_VERSION").to_string(),
                latest,
            },
            scheduler: scheduler_state,
            snapshot: snapshot_metadata,
            settings: SettingsEcho {
                source_type: self.config.source_type,
                base_url: self.config.base_url.clone(),
                directory_display: self.config.ord_directory.display().to_string(),
                auth_methods: self.config.authentication.methods.clone(),
                github_repository: self.config.github_repository.clone(),
                github_branch: self.config.github_branch.clone(),
                update_delay_ms: self.config.update_delay_ms,
                startup_time: self.started_at,
            },
            system_metrics: SystemMetrics::read(&self.config.data_dir),
            request_metrics: self.metrics.snapshot(),
        }
    }

    async fn latest_version(&self) -> Option<String> {
        {
            let cache = self.version_cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < REGISTRY_CACHE_TTL {
                    return cached.latest.clone();
                }
            }
        }

        let latest = self.fetch_latest_release().await;

        let mut cache = self.version_cache.lock().await;
        *cache = Some(VersionCache {
            fetched_at: Instant::now(),
            latest: latest.clone(),
        });
        latest
    }

    async fn fetch_latest_release(&self) -> Option<String> {
        if self.config.source_type != SourceType::Github {
            return None;
        }
        let api_url = self
            .config
            .github_api_url
            .clone()
            .unwrap_or_else(|| "https://api.github.com".to_string());
        let repository = self.config.github_repository.as_ref()?;
        let url = format!("{api_url}/repos/{repository}/releases/latest");

        let response = self
            .http
            .get(&url)
            .header("User-Agent", "ord-gateway")
            .send()
            .await
            .ok()?
            .error_for_status()
            .ok()?;
        let body: serde_json::Value = response.json().await.ok()?;
        body.get("tag_name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }
}
