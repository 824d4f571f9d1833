//! Slot layout: which provider is mounted where

use crate::core::provider::Provider;
use crate::core::slot::SlotId;
use serde::{Deserialize, Serialize};

/// Provider assignment for the four slots (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotLayout {
    pub top_left: Provider,
    pub top_right: Provider,
    pub bottom_left: Provider,
    pub bottom_right: Provider,
}

impl Default for SlotLayout {
    fn default() -> Self {
        Self {
            top_left: Provider::Claude,
            top_right: Provider::Perplexity,
            bottom_left: Provider::ChatGpt,
            bottom_right: Provider::Gemini,
        }
    }
}

impl SlotLayout {
    /// Provider mounted in `slot`
    pub fn provider(&self, slot: SlotId) -> &Provider {
        match slot {
            SlotId::TopLeft => &self.top_left,
            SlotId::TopRight => &self.top_right,
            SlotId::BottomLeft => &self.bottom_left,
            SlotId::BottomRight => &self.bottom_right,
        }
    }

    /// Mount a different provider in `slot`, returning the previous one
    pub fn swap(&mut self, slot: SlotId, provider: Provider) -> Provider {
        let entry = match slot {
            SlotId::TopLeft => &mut self.top_left,
            SlotId::TopRight => &mut self.top_right,
            SlotId::BottomLeft => &mut self.bottom_left,
            SlotId::BottomRight => &mut self.bottom_right,
        };
        std::mem::replace(entry, provider)
    }

    /// `(slot, provider)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Provider)> {
        SlotId::ALL.into_iter().map(|slot| (slot, self.provider(slot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let layout = SlotLayout::default();
        assert_eq!(layout.provider(SlotId::TopLeft), &Provider::Claude);
        assert_eq!(layout.provider(SlotId::TopRight), &Provider::Perplexity);
        assert_eq!(layout.provider(SlotId::BottomLeft), &Provider::ChatGpt);
        assert_eq!(layout.provider(SlotId::BottomRight), &Provider::Gemini);
    }

    #[test]
    fn test_swap_returns_previous() {
        let mut layout = SlotLayout::default();
        let previous = layout.swap(SlotId::TopRight, Provider::ChatGpt);
        assert_eq!(previous, Provider::Perplexity);
        assert_eq!(layout.provider(SlotId::TopRight), &Provider::ChatGpt);
    }

    #[test]
    fn test_iter_follows_slot_order() {
        let layout = SlotLayout::default();
        let slots: Vec<SlotId> = layout.iter().map(|(slot, _)| slot).collect();
        assert_eq!(slots, SlotId::ALL.to_vec());
    }
}
