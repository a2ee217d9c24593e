//! Update scheduler: debounces triggers, serializes updates, coalesces
//! webhook bursts, and can abort an in-flight fetch for a newer trigger.
//!
//! All mutating operations funnel through a single `tokio::sync::Mutex`
//! (the "single-writer queue" of spec.md §4.E); observers read scheduler
//! state through a `tokio::sync::RwLock` snapshot without contending with
//! the writer.

mod events;
mod state;

pub use events::SchedulerEvent;
pub use state::{SchedulerState, SchedulerStatus};

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::GatewayError;
use crate::fetcher::{ContentFetcher, FetchProgress};
use crate::observability::{
    AuditAction, AuditLog, AuditRecord, Event, MetricsRegistry, ObservationScope, Timer,
};
use crate::processor::DocumentProcessor;
use crate::snapshot::SnapshotManager;

struct Writer {
    timer: Option<JoinHandle<()>>,
    in_flight: Option<CancellationToken>,
    webhook_pending: bool,
    /// Bumped each time `run_update` claims the writer, so a superseded
    /// update's cleanup can tell it's no longer the current one and skip
    /// clearing `in_flight` out from under the update that replaced it.
    generation: u64,
}

pub struct UpdateScheduler {
    state: RwLock<SchedulerState>,
    writer: Mutex<Writer>,
    snapshot: Arc<SnapshotManager>,
    fetcher: Arc<dyn ContentFetcher>,
    processor: Arc<DocumentProcessor>,
    metrics: Arc<MetricsRegistry>,
    audit: Option<Arc<AuditLog>>,
    events: broadcast::Sender<SchedulerEvent>,
    update_delay: Duration,
}

impl UpdateScheduler {
    pub fn new(
        snapshot: Arc<SnapshotManager>,
        fetcher: Arc<dyn ContentFetcher>,
        processor: Arc<DocumentProcessor>,
        metrics: Arc<MetricsRegistry>,
        audit: Option<Arc<AuditLog>>,
        update_delay: Duration,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            state: RwLock::new(SchedulerState::default()),
            writer: Mutex::new(Writer {
                timer: None,
                in_flight: None,
                webhook_pending: false,
                generation: 0,
            }),
            snapshot,
            fetcher,
            processor,
            metrics,
            audit,
            events,
            update_delay,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent> {
        self.events.subscribe()
    }

    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    /// Cancels any in-flight fetch, used during shutdown. Waits for the
    /// cancelled update to reach a terminal state before returning.
    pub async fn abort_in_flight(&self) {
        let token = self.writer.lock().await.in_flight.clone();
        if let Some(token) = token {
            token.cancel();
            self.fetcher.abort_fetch();
            while self.writer.lock().await.in_flight.is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        }
    }

    /// Restores `lastUpdateTime` from persisted metadata.
    pub async fn initialize(&self) {
        if let Some(metadata) = self.snapshot.load_metadata() {
            let mut state = self.state.write().await;
            state.last_update_time = Some(metadata.fetch_time);
        }
    }

    /// Arms a debounce timer. Any existing timer is cancelled and rearmed.
    /// If an update is already in progress, it is aborted before the new
    /// timer fires.
    pub async fn schedule(self: &Arc<Self>, delay: Duration) {
        let mut writer = self.writer.lock().await;
        if let Some(handle) = writer.timer.take() {
            handle.abort();
        }
        if let Some(token) = &writer.in_flight {
            token.cancel();
        }

        {
            let mut state = self.state.write().await;
            state.status = SchedulerStatus::Scheduled;
            state.scheduled_time = Some(Utc::now() + chrono::Duration::milliseconds(delay.as_millis() as i64));
        }
        self.emit(SchedulerEvent::Scheduled);

        let scheduler = Arc::clone(self);
        writer.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            scheduler.run_update(Some("debounce")).await;
        }));
    }

    /// Cancels any timer and runs immediately. Fails with
    /// `AlreadyInProgress` if an update is already running.
    pub async fn force_update(self: &Arc<Self>) -> Result<(), GatewayError> {
        {
            let mut writer = self.writer.lock().await;
            if writer.in_flight.is_some() {
                return Err(GatewayError::AlreadyInProgress);
            }
            if let Some(handle) = writer.timer.take() {
                handle.abort();
            }
        }
        self.run_update(Some("manual")).await;
        Ok(())
    }

    /// Webhook-triggered path. Enforces a cooldown equal to `updateDelay`
    /// since the last webhook-initiated update.
    pub async fn schedule_immediate(self: &Arc<Self>) {
        let cooldown_remaining = {
            let state = self.state.read().await;
            state.last_webhook_time.and_then(|last| {
                let elapsed = Utc::now().signed_duration_since(last).to_std().ok()?;
                self.update_delay.checked_sub(elapsed)
            })
        };

        {
            let mut writer = self.writer.lock().await;
            if let Some(token) = &writer.in_flight {
                token.cancel();
            }
            if let Some(handle) = writer.timer.take() {
                handle.abort();
            }
            if let Some(remaining) = cooldown_remaining {
                if writer.webhook_pending {
                    return;
                }
                writer.webhook_pending = true;
                let scheduler = Arc::clone(self);
                writer.timer = Some(tokio::spawn(async move {
                    tokio::time::sleep(remaining).await;
                    scheduler.run_webhook_update().await;
                }));
                return;
            }
        }
        self.run_webhook_update().await;
    }

    async fn run_webhook_update(self: &Arc<Self>) {
        {
            let mut writer = self.writer.lock().await;
            writer.webhook_pending = false;
        }
        {
            let mut state = self.state.write().await;
            state.last_webhook_time = Some(Utc::now());
        }
        self.run_update(Some("webhook")).await;
    }

    /// Compares the persisted commit hash with the fetcher's latest.
    pub async fn check_for_updates(&self) -> Result<bool, GatewayError> {
        let current = self.snapshot.get_current_fingerprint();
        let latest = self.fetcher.get_latest_commit_sha().await?;
        Ok(current.as_deref() != Some(latest.as_str()))
    }

    fn emit(&self, event: SchedulerEvent) {
        let _ = self.events.send(event);
    }

    async fn run_update(self: &Arc<Self>, reason: Option<&str>) {
        let token = CancellationToken::new();
        let my_generation = {
            let mut writer = self.writer.lock().await;
            writer.generation += 1;
            writer.in_flight = Some(token.clone());
            writer.timer = None;
            writer.generation
        };

        {
            let mut state = self.state.write().await;
            state.status = SchedulerStatus::InProgress;
        }
        self.metrics.increment_updates_started();
        self.emit(SchedulerEvent::Started);
        let scope = match reason {
            Some(reason) => ObservationScope::with_fields("UPDATE", &[("reason", reason)]),
            None => ObservationScope::new("UPDATE"),
        };
        let timer = Timer::new();

        let result = self.run_update_steps(&token).await;

        {
            let mut writer = self.writer.lock().await;
            if writer.generation == my_generation {
                writer.in_flight = None;
            }
        }

        match result {
            Ok(commit_hash) => {
                let mut state = self.state.write().await;
                state.status = SchedulerStatus::Idle;
                state.last_update_time = Some(Utc::now());
                state.failed_count = 0;
                state.last_error = None;
                drop(state);
                self.metrics.increment_updates_completed();
                self.emit(SchedulerEvent::Completed { commit_hash: commit_hash.clone() });
                scope.complete_with_fields(&[("commit", &commit_hash), ("elapsed_ms", &timer.elapsed_ms())]);
                self.processor.warm();
            }
            Err(err) => {
                let _ = self.snapshot.cleanup_staging();
                let is_supersede = err.is_supersede();
                let mut state = self.state.write().await;
                if !is_supersede {
                    state.status = SchedulerStatus::Failed;
                    state.failed_count += 1;
                    state.last_error = Some(err.to_string());
                } else {
                    state.status = SchedulerStatus::Idle;
                }
                drop(state);
                if !is_supersede {
                    self.metrics.increment_updates_failed();
                    self.emit(SchedulerEvent::Failed { error: err.to_string() });
                    scope.fail(&format!("{err} (after {}ms)", timer.elapsed_ms()));
                    if let Some(audit) = &self.audit {
                        audit.record(
                            AuditRecord::new(AuditAction::SchedulerTransition)
                                .with_detail(format!("update failed: {err}")),
                        );
                    }
                } else {
                    scope.complete_with_fields(&[("superseded", "true"), ("elapsed_ms", &timer.elapsed_ms())]);
                }
            }
        }
    }

    async fn run_update_steps(&self, token: &CancellationToken) -> Result<String, GatewayError> {
        let staging = self.snapshot.staging_directory()?;

        let events = self.events.clone();
        let cancel_for_fetch = token.clone();
        let progress: crate::fetcher::ProgressCallback = Box::new(move |p: &FetchProgress| {
            if cancel_for_fetch.is_cancelled() {
                return;
            }
            let _ = events.send(SchedulerEvent::Progress {
                total_files: p.total_files,
                fetched_files: p.fetched_files,
            });
        });

        let fetch = self.fetcher.fetch_all_content(&staging, progress);
        let metadata = tokio::select! {
            result = fetch => result?,
            _ = token.cancelled() => {
                self.fetcher.abort_fetch();
                return Err(GatewayError::Cancelled);
            }
        };

        if !self.snapshot.validate(&staging) {
            return Err(GatewayError::ContentInvalid(
                "staging directory missing documents subdirectory".to_string(),
            ));
        }

        let now_millis = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.snapshot.swap(&staging, now_millis)?;
        crate::observability::log_event(Event::SnapshotSwapped);

        let commit_hash = metadata.commit_hash.clone();
        self.snapshot.save_metadata(&metadata);
        Ok(commit_hash)
    }
}
