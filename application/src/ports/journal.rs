//! Port for the structured cycle journal.
//!
//! Records what happened in each cycle (submits, completions, merges) to a
//! machine-readable log. This is separate from `tracing`: tracing carries
//! diagnostics, the journal carries the answers themselves.

use serde_json::Value;

/// A structured cycle event
///
/// Each event has a type string and a JSON payload with event-specific fields.
/// The timestamp is added by the journal implementation.
#[derive(Debug, Clone)]
pub struct CycleEvent {
    /// Event type identifier (e.g., "submit", "source_complete", "merge").
    pub event_type: &'static str,
    pub payload: Value,
}

impl CycleEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for recording cycle events
///
/// `record` is synchronous and infallible; implementations swallow write
/// failures so journaling never disturbs the event loop.
pub trait CycleJournal: Send + Sync {
    fn record(&self, event: CycleEvent);
}

/// No-op implementation for tests and when journaling is disabled.
pub struct NoCycleJournal;

impl CycleJournal for NoCycleJournal {
    fn record(&self, _event: CycleEvent) {}
}
