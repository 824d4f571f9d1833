//! Status notification port
//!
//! Defines the interface for reporting cycle progress to the user.

use polyquorum_domain::{Provider, Response, SlotId, SynthesisRequest};

/// Callback for status updates during a cycle
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, status bar, etc.)
pub trait StatusObserver: Send + Sync {
    /// Called whenever the completed count changes or a cycle starts
    fn on_status(&self, completed: usize, total: usize);

    /// Called once per cycle when every source finished and auto-merge is off
    fn on_ready_for_manual_merge(&self);

    // ==================== Optional Callbacks ====================

    /// Called when a source's partial text changes
    fn on_source_update(&self, _slot: SlotId, _text: &str, _busy: bool) {}

    /// Called when a source finishes answering
    fn on_source_complete(&self, _slot: SlotId, _provider: &Provider, _response: &Response) {}

    /// Called when the synthesis request is sent to the sink
    fn on_merge(&self, _sink: SlotId, _request: &SynthesisRequest) {}
}

/// No-op status observer for when status reporting is not needed
pub struct NoStatus;

impl StatusObserver for NoStatus {
    fn on_status(&self, _completed: usize, _total: usize) {}
    fn on_ready_for_manual_merge(&self) {}
}
