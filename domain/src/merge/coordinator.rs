//! Merge coordinator state machine
//!
//! Collects completions from every non-sink slot for the current question
//! and decides when to merge: automatically at full quorum, early when the
//! auto-merge timeout fires, or on an explicit trigger.

use super::cycle::Cycle;
use super::settings::{MergeSettings, MergeTimeout};
use super::synthesis::SynthesisRequest;
use crate::core::provider::Provider;
use crate::core::slot::SlotId;
use crate::source::response::Response;
use crate::timer::{TimerCommand, TimerPurpose, TimerRegistry, TimerToken};

/// Coordinator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    Collecting,
    /// Synthesis request delivered, sink submit pending
    Merging,
}

impl CoordinatorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordinatorPhase::Idle => "idle",
            CoordinatorPhase::Collecting => "collecting",
            CoordinatorPhase::Merging => "merging",
        }
    }
}

/// Effects requested by the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorEvent {
    Status { completed: usize, total: usize },
    /// Every eligible slot completed and auto-merge is off
    ReadyForManualMerge,
    /// Inject the synthesis request into the sink's input
    DeliverSynthesis {
        sink: SlotId,
        request: SynthesisRequest,
    },
    /// Submit the sink's input
    SubmitSink { sink: SlotId },
}

/// Merge coordinator (Entity)
#[derive(Debug)]
pub struct MergeCoordinator {
    settings: MergeSettings,
    phase: CoordinatorPhase,
    cycle: Cycle,
    ready_notified: bool,
    /// Latched on the cycle's first completion, even if it is later reclassified
    first_completion_seen: bool,
    merge_sink: Option<SlotId>,
    timers: TimerRegistry,
}

impl MergeCoordinator {
    pub fn new(settings: MergeSettings) -> Self {
        Self {
            settings,
            phase: CoordinatorPhase::Idle,
            cycle: Cycle::default(),
            ready_notified: false,
            first_completion_seen: false,
            merge_sink: None,
            timers: TimerRegistry::new(),
        }
    }

    /// Number of slots that contribute to a merge
    pub fn total(&self) -> usize {
        SlotId::COUNT - 1
    }

    pub fn phase(&self) -> CoordinatorPhase {
        self.phase
    }

    pub fn settings(&self) -> &MergeSettings {
        &self.settings
    }

    pub fn cycle(&self) -> &Cycle {
        &self.cycle
    }

    pub fn completed_count(&self) -> usize {
        self.cycle.completed_count()
    }

    pub fn take_timer_commands(&mut self) -> Vec<TimerCommand> {
        self.timers.take_commands()
    }

    fn status(&self) -> CoordinatorEvent {
        CoordinatorEvent::Status {
            completed: self.cycle.completed_count(),
            total: self.total(),
        }
    }

    fn clear(&mut self) {
        self.timers.reset();
        self.cycle.clear();
        self.phase = CoordinatorPhase::Idle;
        self.ready_notified = false;
        self.first_completion_seen = false;
        self.merge_sink = None;
    }

    // ==================== Cycle lifecycle ====================

    /// Drop the current cycle and cancel every pending timer
    pub fn reset(&mut self) -> Vec<CoordinatorEvent> {
        self.clear();
        vec![self.status()]
    }

    /// A question was submitted: start a fresh cycle
    pub fn on_submit(&mut self, question: &str) -> Vec<CoordinatorEvent> {
        self.clear();
        let captured = self
            .settings
            .aggregation_enabled
            .then(|| question.to_string());
        self.cycle.begin(captured, self.settings.sink);
        self.phase = CoordinatorPhase::Collecting;
        vec![self.status()]
    }

    /// A source finished answering
    pub fn on_complete(
        &mut self,
        slot: SlotId,
        provider: Provider,
        response: Response,
    ) -> Vec<CoordinatorEvent> {
        if self.phase != CoordinatorPhase::Collecting || !self.settings.aggregation_enabled {
            return Vec::new();
        }
        if !self.cycle.record(slot, provider, response) {
            return Vec::new();
        }

        let mut events = vec![self.status()];
        let completed = self.cycle.completed_count();
        let first = !std::mem::replace(&mut self.first_completion_seen, true);

        if first
            && self.settings.auto_merge
            && let Some(after) = self.settings.timeout.duration()
        {
            self.timers.arm(TimerPurpose::AutoMergeTimeout, after);
        }

        if completed >= self.total() {
            self.timers.cancel(TimerPurpose::AutoMergeTimeout);
            if self.settings.auto_merge {
                events.extend(self.merge());
            } else if !self.ready_notified {
                self.ready_notified = true;
                events.push(CoordinatorEvent::ReadyForManualMerge);
            }
        }

        events
    }

    /// Process a fired timer; stale tokens are ignored
    pub fn on_timer(&mut self, token: TimerToken) -> Vec<CoordinatorEvent> {
        if !self.timers.fire(token) {
            return Vec::new();
        }

        match token.purpose {
            TimerPurpose::AutoMergeTimeout
                if self.phase == CoordinatorPhase::Collecting && self.settings.auto_merge =>
            {
                self.merge()
            }
            TimerPurpose::SinkSubmit => {
                let sink = self.merge_sink.take().unwrap_or(self.settings.sink);
                self.cycle.clear();
                self.phase = CoordinatorPhase::Idle;
                self.ready_notified = false;
                vec![CoordinatorEvent::SubmitSink { sink }, self.status()]
            }
            _ => Vec::new(),
        }
    }

    /// Merge whatever has been collected.
    ///
    /// A no-op when nothing was collected or a merge is already in flight.
    pub fn merge(&mut self) -> Vec<CoordinatorEvent> {
        if self.phase == CoordinatorPhase::Merging {
            return Vec::new();
        }
        let Some(request) = SynthesisRequest::from_cycle(&self.cycle) else {
            return Vec::new();
        };

        let sink = self.settings.sink;
        self.timers.cancel(TimerPurpose::AutoMergeTimeout);
        self.timers
            .arm(TimerPurpose::SinkSubmit, self.settings.sink_submit_delay);
        self.phase = CoordinatorPhase::Merging;
        self.merge_sink = Some(sink);

        vec![CoordinatorEvent::DeliverSynthesis { sink, request }]
    }

    // ==================== Settings ====================

    /// Move the sink; a response already collected from it is dropped
    pub fn set_sink(&mut self, sink: SlotId) -> Vec<CoordinatorEvent> {
        self.settings.sink = sink;
        self.cycle.reclassify(sink);
        if self.cycle.completed_count() < self.total() {
            self.ready_notified = false;
        }
        vec![self.status()]
    }

    pub fn set_aggregation(&mut self, enabled: bool) {
        self.settings.aggregation_enabled = enabled;
    }

    /// Turning auto-merge off also drops a running timeout
    pub fn set_auto_merge(&mut self, enabled: bool) {
        self.settings.auto_merge = enabled;
        if !enabled {
            self.timers.cancel(TimerPurpose::AutoMergeTimeout);
        }
    }

    pub fn set_timeout(&mut self, timeout: MergeTimeout) {
        self.settings.timeout = timeout;
    }
}
