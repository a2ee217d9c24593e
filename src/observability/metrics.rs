//! Metrics registry for the gateway
//!
//! - Counters only, monotonic for the life of the process
//! - Thread-safe via atomics, relaxed ordering (exact values are not
//!   required across threads, only within a single read)

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use sysinfo::{Disks, System};

/// Request/update/auth counters, exposed via `/api/v1/status`.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    auth_rejections: AtomicU64,
    webhooks_received: AtomicU64,
    webhooks_rejected: AtomicU64,
    updates_started: AtomicU64,
    updates_completed: AtomicU64,
    updates_failed: AtomicU64,
    documents_served: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_requests(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_auth_rejections(&self) {
        self.auth_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_received(&self) {
        self.webhooks_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_webhooks_rejected(&self) {
        self.webhooks_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates_started(&self) {
        self.updates_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates_completed(&self) {
        self.updates_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates_failed(&self) {
        self.updates_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_documents_served(&self) {
        self.documents_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_failed: self.requests_failed.load(Ordering::Relaxed),
            auth_rejections: self.auth_rejections.load(Ordering::Relaxed),
            webhooks_received: self.webhooks_received.load(Ordering::Relaxed),
            webhooks_rejected: self.webhooks_rejected.load(Ordering::Relaxed),
            updates_started: self.updates_started.load(Ordering::Relaxed),
            updates_completed: self.updates_completed.load(Ordering::Relaxed),
            updates_failed: self.updates_failed.load(Ordering::Relaxed),
            documents_served: self.documents_served.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_failed: u64,
    pub auth_rejections: u64,
    pub webhooks_received: u64,
    pub webhooks_rejected: u64,
    pub updates_started: u64,
    pub updates_completed: u64,
    pub updates_failed: u64,
    pub documents_served: u64,
}

/// Heap and filesystem usage, read on demand for the status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SystemMetrics {
    pub heap_used_bytes: u64,
    pub heap_limit_bytes: u64,
    pub fs_used_bytes: u64,
    pub fs_total_bytes: u64,
}

impl SystemMetrics {
    /// Read current process memory and the filesystem backing `data_dir`.
    ///
    /// Best-effort: any field `sysinfo` cannot determine on this platform is
    /// reported as zero rather than failing the whole status response.
    pub fn read(data_dir: &Path) -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        let disks = Disks::new_with_refreshed_list();

        let heap_used_bytes = sys.used_memory().saturating_mul(1024);
        let heap_limit_bytes = sys.total_memory().saturating_mul(1024);

        let (fs_used_bytes, fs_total_bytes) = disk_usage_for(&disks, data_dir);

        Self {
            heap_used_bytes,
            heap_limit_bytes,
            fs_used_bytes,
            fs_total_bytes,
        }
    }
}

fn disk_usage_for(disks: &Disks, data_dir: &Path) -> (u64, u64) {
    let canonical = data_dir
        .canonicalize()
        .unwrap_or_else(|_| data_dir.to_path_buf());

    let mut best: Option<(&std::path::Path, u64, u64)> = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let depth = mount.components().count();
            if best.map(|(m, _, _)| depth > m.components().count()).unwrap_or(true) {
                best = Some((mount, disk.total_space(), disk.available_space()));
            }
        }
    }

    match best {
        Some((_, total, available)) => (total.saturating_sub(available), total),
        None => (0, 0),
    }
}
