//! Source monitor
//!
//! Binds one slot's [`CompletionDetector`] to the observation port: locates
//! the target, samples it, and feeds the detector. Target loss is handled
//! here with a bounded rescan so the detector itself never touches I/O.

use crate::ports::observation::{ObservationPort, TargetHandle};
use polyquorum_domain::{
    CompletionDetector, DetectorEvent, DetectorTimings, Observation, Provider, SelectorConfig,
    SlotId, TimerCommand, TimerPurpose, TimerToken,
};
use tracing::{debug, warn};

/// Completion tracking for one slot
pub struct SourceMonitor {
    slot: SlotId,
    provider: Provider,
    selectors: SelectorConfig,
    detector: CompletionDetector,
    target: Option<TargetHandle>,
    gave_up: bool,
}

impl SourceMonitor {
    pub fn new(
        slot: SlotId,
        provider: Provider,
        selectors: SelectorConfig,
        timings: DetectorTimings,
    ) -> Self {
        Self {
            slot,
            provider,
            selectors,
            detector: CompletionDetector::new(timings),
            target: None,
            gave_up: false,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn detector(&self) -> &CompletionDetector {
        &self.detector
    }

    pub fn take_timer_commands(&mut self) -> Vec<TimerCommand> {
        self.detector.take_timer_commands()
    }

    /// Start a new cycle: clear detector state and remember what is on screen
    pub fn reset(&mut self, port: &dyn ObservationPort) {
        self.detector.reset();
        self.target = None;
        self.gave_up = false;

        if let Some(target) = port.locate_target(self.slot, &self.selectors)
            && let Some(extraction) = port.extract_text(&target)
        {
            self.detector.prime(&extraction.text);
            self.target = Some(target);
        }
    }

    /// Mount a different provider in this slot
    pub fn swap_provider(
        &mut self,
        provider: Provider,
        selectors: SelectorConfig,
        port: &dyn ObservationPort,
    ) {
        self.provider = provider;
        self.selectors = selectors;
        self.reset(port);
    }

    /// Sample the target and feed the detector
    pub fn observe(&mut self, port: &dyn ObservationPort) -> Vec<DetectorEvent> {
        let Some(target) = self.acquire(port) else {
            return Vec::new();
        };

        let Some(extraction) = port.extract_text(&target) else {
            debug!("{}: target went stale, locating again", self.slot);
            self.target = None;
            self.lost();
            return Vec::new();
        };

        let busy = port.is_busy_marker_present(&target, &self.selectors);
        let mut observation =
            Observation::new(extraction.text, busy).with_markup(extraction.raw_markup);
        if let Some(selector) = extraction.selector_id {
            observation = observation.with_selector(selector);
        }

        let phase_before = self.detector.phase();
        let events = self.detector.on_observation(observation);
        if self.detector.phase() != phase_before {
            debug!(
                "{}: {} -> {}",
                self.slot,
                phase_before.as_str(),
                self.detector.phase().as_str()
            );
        }
        events
    }

    /// Deliver a fired timer.
    ///
    /// The target is sampled first so the attempt sees the latest state.
    pub fn on_timer(&mut self, token: TimerToken, port: &dyn ObservationPort) -> Vec<DetectorEvent> {
        if token.purpose == TimerPurpose::Rescan {
            let events = self.detector.on_timer(token);
            if events.contains(&DetectorEvent::RescanDue) {
                return self.observe(port);
            }
            return events;
        }

        let mut events = self.observe(port);
        events.extend(self.detector.on_timer(token));
        events
    }

    fn acquire(&mut self, port: &dyn ObservationPort) -> Option<TargetHandle> {
        if let Some(target) = &self.target {
            return Some(target.clone());
        }

        match port.locate_target(self.slot, &self.selectors) {
            Some(target) => {
                self.detector.on_target_found();
                self.gave_up = false;
                self.target = Some(target.clone());
                Some(target)
            }
            None => {
                self.lost();
                None
            }
        }
    }

    fn lost(&mut self) {
        if self.detector.on_target_lost() {
            debug!("{}: response target not found, rescan scheduled", self.slot);
        } else if !self.gave_up {
            self.gave_up = true;
            warn!(
                "{} ({}): response target not found, giving up for this cycle",
                self.slot, self.provider
            );
        }
    }
}
