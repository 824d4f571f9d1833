//! Sink dispatch port
//!
//! Writes into the sources' input surfaces: typing text, pressing submit,
//! and starting a new conversation.

use async_trait::async_trait;
use polyquorum_domain::SlotId;
use thiserror::Error;

/// Errors that can occur while delivering to a slot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Input element not found in {0}")]
    InputNotFound(SlotId),

    #[error("Submit control not found in {0}")]
    SubmitNotFound(SlotId),

    #[error("Slot {0} is not available")]
    Unavailable(SlotId),

    #[error("Dispatch failed: {0}")]
    Failed(String),
}

/// Port for writing into source input surfaces
///
/// Failures are reported per slot; callers skip the failing slot and carry on.
#[async_trait]
pub trait SinkDispatch: Send + Sync {
    /// Replace the input contents of `slot` with `text`
    async fn deliver_text(&self, slot: SlotId, text: &str) -> Result<(), DispatchError>;

    /// Trigger submission of whatever is in the input of `slot`
    async fn deliver_submit(&self, slot: SlotId) -> Result<(), DispatchError>;

    /// Start a fresh conversation in `slot`
    async fn deliver_new_topic(&self, slot: SlotId) -> Result<(), DispatchError>;
}
