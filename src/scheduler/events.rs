//! Scheduler-emitted events, fed to the audit log and the status push
//! channel. Wire `type` values must match spec.md §6's push-frame
//! contract exactly.

use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    Scheduled,
    Started,
    Progress { total_files: u64, fetched_files: u64 },
    Completed { commit_hash: String },
    Failed { error: String },
}

impl SchedulerEvent {
    pub fn type_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "update-scheduled",
            Self::Started => "update-started",
            Self::Progress { .. } => "update-progress",
            Self::Completed { .. } => "update-completed",
            Self::Failed { .. } => "update-failed",
        }
    }

    pub fn to_frame(&self) -> Value {
        match self {
            Self::Scheduled | Self::Started => json!({"type": self.type_str()}),
            Self::Progress { total_files, fetched_files } => json!({
                "type": self.type_str(),
                "totalFiles": total_files,
                "fetchedFiles": fetched_files,
            }),
            Self::Completed { commit_hash } => json!({
                "type": self.type_str(),
                "commitHash": commit_hash,
            }),
            Self::Failed { error } => json!({
                "type": self.type_str(),
                "error": error,
            }),
        }
    }
}
