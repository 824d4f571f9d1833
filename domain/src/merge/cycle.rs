//! Per-question collection state

use crate::core::provider::Provider;
use crate::core::slot::SlotId;
use crate::source::response::Response;
use std::collections::{BTreeMap, BTreeSet};

/// A completed answer together with the provider that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedResponse {
    pub provider: Provider,
    pub response: Response,
}

/// The merge coordinator's unit of work (Entity)
///
/// Holds what has been collected for one question. Only non-excluded
/// slots are ever stored, so the completed count is the map size.
#[derive(Debug, Clone, Default)]
pub struct Cycle {
    question: Option<String>,
    excluded_slot: SlotId,
    pending_slots: BTreeSet<SlotId>,
    collected: BTreeMap<SlotId, CollectedResponse>,
}

impl Cycle {
    /// Start collecting for a new question
    pub fn begin(&mut self, question: Option<String>, excluded_slot: SlotId) {
        self.question = question;
        self.excluded_slot = excluded_slot;
        self.collected.clear();
        self.pending_slots = SlotId::ALL
            .into_iter()
            .filter(|slot| *slot != excluded_slot)
            .collect();
    }

    /// Drop everything collected and the captured question
    pub fn clear(&mut self) {
        self.question = None;
        self.collected.clear();
        self.pending_slots.clear();
    }

    /// Record a completion. Returns `false` for the excluded slot or a repeat.
    pub fn record(&mut self, slot: SlotId, provider: Provider, response: Response) -> bool {
        if slot == self.excluded_slot || self.collected.contains_key(&slot) {
            return false;
        }
        self.pending_slots.remove(&slot);
        self.collected
            .insert(slot, CollectedResponse { provider, response });
        true
    }

    /// Move the exclusion to `slot`: its response (if any) is dropped and
    /// the previously excluded slot becomes pending again.
    pub fn reclassify(&mut self, slot: SlotId) -> Option<CollectedResponse> {
        let previous = std::mem::replace(&mut self.excluded_slot, slot);
        let dropped = self.collected.remove(&slot);
        self.pending_slots.remove(&slot);
        if previous != slot && !self.collected.contains_key(&previous) {
            self.pending_slots.insert(previous);
        }
        dropped
    }

    pub fn question(&self) -> Option<&str> {
        self.question.as_deref()
    }

    pub fn excluded_slot(&self) -> SlotId {
        self.excluded_slot
    }

    pub fn pending_slots(&self) -> &BTreeSet<SlotId> {
        &self.pending_slots
    }

    pub fn completed_count(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    /// Collected responses in slot order
    pub fn responses(&self) -> impl Iterator<Item = (SlotId, &CollectedResponse)> {
        self.collected.iter().map(|(slot, collected)| (*slot, collected))
    }

    pub fn response(&self, slot: SlotId) -> Option<&CollectedResponse> {
        self.collected.get(&slot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(excluded: SlotId) -> Cycle {
        let mut cycle = Cycle::default();
        cycle.begin(Some("q".to_string()), excluded);
        cycle
    }

    #[test]
    fn test_begin_sets_pending_slots() {
        let cycle = started(SlotId::BottomRight);
        assert_eq!(cycle.pending_slots().len(), 3);
        assert!(!cycle.pending_slots().contains(&SlotId::BottomRight));
        assert_eq!(cycle.question(), Some("q"));
    }

    #[test]
    fn test_record_ignores_excluded_and_repeats() {
        let mut cycle = started(SlotId::BottomRight);
        assert!(!cycle.record(
            SlotId::BottomRight,
            Provider::Gemini,
            Response::from_text("sink")
        ));
        assert!(cycle.record(SlotId::TopLeft, Provider::Claude, Response::from_text("a")));
        assert!(!cycle.record(SlotId::TopLeft, Provider::Claude, Response::from_text("b")));
        assert_eq!(cycle.completed_count(), 1);
        assert_eq!(
            cycle.response(SlotId::TopLeft).unwrap().response.text,
            "a"
        );
    }

    #[test]
    fn test_reclassify_drops_new_sink_and_frees_old() {
        let mut cycle = started(SlotId::BottomRight);
        cycle.record(SlotId::TopLeft, Provider::Claude, Response::from_text("a"));
        cycle.record(SlotId::TopRight, Provider::Perplexity, Response::from_text("b"));

        let dropped = cycle.reclassify(SlotId::TopLeft).unwrap();
        assert_eq!(dropped.response.text, "a");
        assert_eq!(cycle.completed_count(), 1);
        assert_eq!(cycle.excluded_slot(), SlotId::TopLeft);
        assert!(cycle.pending_slots().contains(&SlotId::BottomRight));
        assert!(!cycle.pending_slots().contains(&SlotId::TopLeft));

        assert!(cycle.record(SlotId::BottomRight, Provider::Gemini, Response::from_text("c")));
        assert!(!cycle.record(SlotId::TopLeft, Provider::Claude, Response::from_text("a")));
    }

    #[test]
    fn test_clear() {
        let mut cycle = started(SlotId::BottomRight);
        cycle.record(SlotId::TopLeft, Provider::Claude, Response::from_text("a"));
        cycle.clear();
        assert!(cycle.is_empty());
        assert!(cycle.question().is_none());
        assert!(cycle.pending_slots().is_empty());
    }
}
