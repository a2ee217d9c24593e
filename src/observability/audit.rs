//! Audit logging for scheduler transitions and authentication decisions.
//!
//! - Every scheduler state transition and every auth rejection is recorded.
//! - The audit log is append-only JSON Lines; writes are synced before the
//!   call returns so a crash cannot silently drop a record.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Kind of event being audited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    SchedulerTransition,
    AuthRejected,
    AuthAccepted,
    WebhookRejected,
    MtlsCertWindowMismatch,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchedulerTransition => "scheduler_transition",
            Self::AuthRejected => "auth_rejected",
            Self::AuthAccepted => "auth_accepted",
            Self::WebhookRejected => "webhook_rejected",
            Self::MtlsCertWindowMismatch => "mtls_cert_window_mismatch",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single audit record, serialized as one JSON object per line.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_addr: Option<String>,
}

impl AuditRecord {
    pub fn new(action: AuditAction) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: DateTime::<Utc>::from(SystemTime::now()),
            action: action.as_str().to_string(),
            detail: None,
            remote_addr: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }
}

/// Append-only audit sink backed by a single file.
pub struct AuditLog {
    file: Mutex<File>,
}

impl AuditLog {
    /// Open (creating if absent) the audit log at `path`.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Append a record, fsync'ing before returning.
    pub fn record(&self, record: AuditRecord) {
        let Ok(mut line) = serde_json::to_string(&record) else {
            return;
        };
        line.push('\n');

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        let _ = file.write_all(line.as_bytes());
        let _ = file.sync_all();
    }

    /// Convenience constructor for tests: a log file inside a temp directory.
    #[cfg(test)]
    pub fn path_for(dir: &Path) -> PathBuf {
        dir.join("audit.jsonl")
    }
}
