//! Scheduler state machine data.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerStatus {
    Idle,
    Scheduled,
    InProgress,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchedulerState {
    pub status: SchedulerStatus,
    pub last_update_time: Option<DateTime<Utc>>,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub failed_count: u64,
    pub last_error: Option<String>,
    pub failed_commit_hash: Option<String>,
    pub last_webhook_time: Option<DateTime<Utc>>,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            status: SchedulerStatus::Idle,
            last_update_time: None,
            scheduled_time: None,
            failed_count: 0,
            last_error: None,
            failed_commit_hash: None,
            last_webhook_time: None,
        }
    }
}
