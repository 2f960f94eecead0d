//! Port for the structured run journal.
//!
//! Defines the [`RunJournal`] trait for recording run events (task
//! transitions, revision states, search errors) to a structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while the journal is a machine-readable
//! record of one run (JSONL).

use serde_json::Value;

/// A structured run event.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The journal adds the timestamp.
pub struct RunEvent {
    /// Event type identifier (e.g., "task_started", "search_error").
    pub event_type: &'static str,
    pub payload: Value,
}

impl RunEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging run events.
///
/// `record` is synchronous and non-fallible so journaling never disrupts a
/// run; write failures are dropped by the implementation.
pub trait RunJournal: Send + Sync {
    fn record(&self, event: RunEvent);
}

/// No-op implementation for tests and when journaling is disabled.
pub struct NoJournal;

impl RunJournal for NoJournal {
    fn record(&self, _event: RunEvent) {}
}
