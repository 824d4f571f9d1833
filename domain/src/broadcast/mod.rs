//! Broadcast targeting: which slots receive a question or submit.

use crate::core::slot::SlotId;

/// Inputs to the targeting rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastScope {
    /// Slot currently maximized, if any
    pub supersized: Option<SlotId>,
    /// Whether responses are being merged into the sink
    pub aggregation_enabled: bool,
    /// Slot that receives the merged answer
    pub sink: SlotId,
}

impl BroadcastScope {
    /// Slots to deliver to, in slot order.
    ///
    /// A supersized slot wins over everything; otherwise aggregation
    /// keeps the sink out of the broadcast.
    pub fn targets(&self) -> Vec<SlotId> {
        if let Some(slot) = self.supersized {
            return vec![slot];
        }
        if self.aggregation_enabled {
            return SlotId::ALL
                .into_iter()
                .filter(|slot| *slot != self.sink)
                .collect();
        }
        SlotId::ALL.to_vec()
    }

    /// Toggle the supersized slot; selecting the same slot again restores the grid
    pub fn toggle_supersize(&mut self, slot: SlotId) -> Option<SlotId> {
        self.supersized = if self.supersized == Some(slot) {
            None
        } else {
            Some(slot)
        };
        self.supersized
    }
}
