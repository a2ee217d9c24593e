//! Observability subsystem: structured logging, lifecycle events, metrics,
//! and an append-only audit log.
//!
//! Observability is read-only with respect to the rest of the system: it
//! never influences request handling or scheduler decisions, and a failure
//! to log or audit is never treated as fatal.
//!
//! ```ignore
//! use ord_gateway::observability::{Logger, Event, MetricsRegistry};
//!
//! Logger::info("request_served", &[("path", "/health")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_requests();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;
pub mod audit;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot, SystemMetrics};
pub use scope::{ObservationScope, Timer};
pub use audit::{AuditAction, AuditLog, AuditRecord};

/// Log a lifecycle event with no extra fields, at INFO severity.
pub fn log_event(event: Event) {
    Logger::info(event.as_str(), &[]);
}

/// Log a lifecycle event with extra fields, at INFO severity.
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::info(event.as_str(), fields);
}
