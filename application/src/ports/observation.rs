//! Observation port
//!
//! Read-only access to the text surface of each source. The engine never
//! interprets selectors itself: it hands the provider's [`SelectorConfig`]
//! to the adapter and gets back an opaque [`TargetHandle`].

use polyquorum_domain::{SelectorConfig, SlotId};

/// Opaque reference to a located response element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetHandle {
    pub slot: SlotId,
    /// Adapter-specific identity (selector that matched, element index, ...)
    pub id: String,
}

impl TargetHandle {
    pub fn new(slot: SlotId, id: impl Into<String>) -> Self {
        Self {
            slot,
            id: id.into(),
        }
    }
}

/// Text pulled from a target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub raw_markup: String,
    /// Selector that produced the text, if the adapter knows it
    pub selector_id: Option<String>,
}

impl Extraction {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Port for observing source surfaces
///
/// Implementations live in the infrastructure layer. All methods are cheap
/// synchronous reads of the latest rendered state.
pub trait ObservationPort: Send + Sync {
    /// Find the element holding the latest response in `slot`
    fn locate_target(&self, slot: SlotId, selectors: &SelectorConfig) -> Option<TargetHandle>;

    /// Read the current text of a located target.
    ///
    /// `None` means the handle went stale and the target must be located again.
    fn extract_text(&self, target: &TargetHandle) -> Option<Extraction>;

    /// Whether the source currently shows its "still generating" marker
    fn is_busy_marker_present(&self, target: &TargetHandle, selectors: &SelectorConfig) -> bool;
}
