//! Bracketed logging for operations with a clear start and a clear outcome —
//! `scheduler::run_update`'s content refresh is the one long-running
//! operation in the gateway that needs this; everything else is a single
//! request/response logged with one `Logger` call.
//!
//! - Logs a BEGIN event on creation
//! - Logs a COMPLETE event when explicitly completed
//! - Logs INCOMPLETE/FAILED on early drop or explicit failure

use std::cell::Cell;

use super::logger::{Logger, Severity};

/// A scope that automatically logs start and complete events
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::with_fields("UPDATE", &[("reason", "webhook")]);
/// // ... fetch, process, swap ...
/// scope.complete_with_fields(&[("commit", &commit_hash)]); // logs UPDATE_COMPLETE
/// // if the task is dropped before complete()/fail() runs, logs UPDATE_INCOMPLETE
/// ```
///
/// # Behavior
///
/// - Logs `{name}_BEGIN` on creation (at INFO level)
/// - Logs `{name}_COMPLETE` when `complete()`/`complete_with_fields()` is
///   called (at INFO level)
/// - Logs `{name}_FAILED` on `fail()`/`fail_fatal()` (at ERROR/FATAL level)
/// - Logs `{name}_INCOMPLETE` on drop if neither ran (at WARN level)
pub struct ObservationScope<'a> {
    name: &'a str,
    completed: Cell<bool>,
    fields: Vec<(&'a str, String)>,
}

impl<'a> ObservationScope<'a> {
    /// Create a new observation scope
    ///
    /// Logs `{name}_BEGIN` immediately.
    pub fn new(name: &'a str) -> Self {
        let event = format!("{}_BEGIN", name);
        Logger::info(&event, &[]);

        Self {
            name,
            completed: Cell::new(false),
            fields: Vec::new(),
        }
    }

    /// Create a new observation scope with additional fields
    pub fn with_fields(name: &'a str, fields: &[(&'a str, &str)]) -> Self {
        let event = format!("{}_BEGIN", name);
        let field_refs: Vec<(&str, &str)> = fields.iter()
            .map(|(k, v)| (*k, *v))
            .collect();
        Logger::info(&event, &field_refs);

        Self {
            name,
            completed: Cell::new(false),
            fields: fields.iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect(),
        }
    }

    /// Mark the scope as successfully completed
    ///
    /// Logs `{name}_COMPLETE` at INFO level.
    pub fn complete(self) {
        self.completed.set(true);
        let event = format!("{}_COMPLETE", self.name);
        let field_refs: Vec<(&str, &str)> = self.fields.iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        Logger::info(&event, &field_refs);
    }

    /// Mark the scope as successfully completed with additional fields
    pub fn complete_with_fields(self, extra_fields: &[(&str, &str)]) {
        self.completed.set(true);
        let event = format!("{}_COMPLETE", self.name);

        let mut all_fields: Vec<(&str, &str)> = self.fields.iter()
            .map(|(k, v)| (*k, v.as_str()))
            .collect();
        all_fields.extend(extra_fields.iter().copied());

        Logger::info(&event, &all_fields);
    }

    /// Mark the scope as failed with a reason
    ///
    /// Logs `{name}_FAILED` at ERROR level.
    pub fn fail(self, reason: &str) {
        self.completed.set(true);
        let event = format!("{}_FAILED", self.name);
        Logger::error(&event, &[("reason", reason)]);
    }

    /// Mark the scope as failed with FATAL severity
    ///
    /// Logs `{name}_FAILED` at FATAL level.
    pub fn fail_fatal(self, reason: &str) {
        self.completed.set(true);
        let event = format!("{}_FAILED", self.name);
        Logger::fatal(&event, &[("reason", reason)]);
    }

    /// Check if the scope has been completed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }
}

impl Drop for ObservationScope<'_> {
    fn drop(&mut self) {
        // Only log error if not already completed
        if !self.completed.get() {
            let event = format!("{}_INCOMPLETE", self.name);
            Logger::warn(&event, &[("reason", "scope dropped without completion")]);
        }
    }
}

/// A simple duration timer for logging elapsed time
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Get elapsed milliseconds as a string
    pub fn elapsed_ms(&self) -> String {
        self.start.elapsed().as_millis().to_string()
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_scope_starts_uncompleted() {
        let scope = ObservationScope::new("UPDATE");
        assert!(!scope.is_completed());
    }

    #[test]
    fn update_scope_completes_with_the_new_commit_hash() {
        let scope = ObservationScope::new("UPDATE");
        scope.complete_with_fields(&[("commit", "a1b2c3d")]);
    }

    #[test]
    fn update_scope_seeded_with_the_schedule_reason_carries_it_through() {
        let scope = ObservationScope::with_fields("UPDATE", &[("reason", "webhook")]);
        scope.complete();
    }

    #[test]
    fn update_scope_records_a_superseded_run_as_a_success() {
        // run_update treats a superseded fetch as a non-fatal outcome,
        // so it completes the scope rather than failing it.
        let scope = ObservationScope::new("UPDATE");
        scope.complete_with_fields(&[("superseded", "true")]);
    }

    #[test]
    fn update_scope_fails_with_the_fetch_error() {
        let scope = ObservationScope::new("UPDATE");
        scope.fail("content fetch timed out");
    }

    #[test]
    fn boot_fetch_scope_fails_fatally_when_the_initial_fetch_cannot_seed_a_snapshot() {
        // lifecycle::run exits the process on this path, so it logs at
        // FATAL rather than ERROR.
        let scope = ObservationScope::new("BOOT_FETCH");
        scope.fail_fatal("initial fetch produced no documents subdirectory");
    }

    #[test]
    fn scope_dropped_mid_update_logs_incomplete_rather_than_panicking() {
        let scope = ObservationScope::new("UPDATE");
        drop(scope);
    }

    #[test]
    fn timer_measures_the_update_duration_fed_into_complete_with_fields() {
        let timer = Timer::new();
        std::thread::sleep(std::time::Duration::from_millis(10));
        let elapsed = timer.elapsed_ms();
        let ms: u64 = elapsed.parse().unwrap();
        assert!(ms >= 10);
    }
}
