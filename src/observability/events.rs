//! Typed scheduler/lifecycle events.
//!
//! These are the event kinds the scheduler emits to its subscribers
//! (status push channel, audit log, request-logging middleware). Kept as a
//! plain enum so every emission site is exhaustively matched rather than
//! stringly typed.

use std::fmt;

/// Observable lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Process boot begins.
    BootStart,
    /// Process is ready to serve requests.
    BootComplete,
    /// Shutdown sequence begins.
    ShutdownStart,
    /// Shutdown sequence complete.
    ShutdownComplete,

    /// Configuration loaded and validated.
    ConfigLoaded,

    /// Update scheduler armed a debounce timer.
    UpdateScheduled,
    /// Content fetch for an update began.
    UpdateStarted,
    /// Progress tick during an in-flight fetch.
    UpdateProgress,
    /// Update swapped in a new snapshot successfully.
    UpdateCompleted,
    /// Update failed; previous snapshot retained.
    UpdateFailed,

    /// Snapshot directory swap succeeded.
    SnapshotSwapped,
    /// Document processor cache for a fingerprint was invalidated.
    CacheInvalidated,
    /// Background warmer finished populating a fingerprint's caches.
    CacheWarmed,

    /// A webhook request was accepted and dispatched to the scheduler.
    WebhookAccepted,
    /// A webhook request was rejected (bad signature, wrong branch, etc).
    WebhookRejected,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "boot_start",
            Event::BootComplete => "boot_complete",
            Event::ShutdownStart => "shutdown_start",
            Event::ShutdownComplete => "shutdown_complete",
            Event::ConfigLoaded => "config_loaded",
            Event::UpdateScheduled => "update-scheduled",
            Event::UpdateStarted => "update-started",
            Event::UpdateProgress => "update-progress",
            Event::UpdateCompleted => "update-completed",
            Event::UpdateFailed => "update-failed",
            Event::SnapshotSwapped => "snapshot_swapped",
            Event::CacheInvalidated => "cache_invalidated",
            Event::CacheWarmed => "cache_warmed",
            Event::WebhookAccepted => "webhook_accepted",
            Event::WebhookRejected => "webhook_rejected",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_push_channel_contract() {
        assert_eq!(Event::UpdateStarted.as_str(), "update-started");
        assert_eq!(Event::UpdateScheduled.as_str(), "update-scheduled");
        assert_eq!(Event::UpdateCompleted.as_str(), "update-completed");
        assert_eq!(Event::UpdateFailed.as_str(), "update-failed");
        assert_eq!(Event::UpdateProgress.as_str(), "update-progress");
    }
}
