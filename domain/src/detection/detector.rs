//! Per-source completion detector state machine

use super::timings::DetectorTimings;
use crate::source::observation::Observation;
use crate::source::response::Response;
use crate::timer::{TimerCommand, TimerPurpose, TimerRegistry, TimerToken};

/// Where a source is in its answer for the current cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorPhase {
    /// Nothing observed yet this cycle
    Idle,
    /// Busy marker present
    Streaming,
    /// A completion attempt is pending (settle, grace, or deferred for empty text)
    SettlingForCompletion,
    /// `Complete` emitted; latched until reset
    Completed,
}

impl DetectorPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorPhase::Idle => "idle",
            DetectorPhase::Streaming => "streaming",
            DetectorPhase::SettlingForCompletion => "settling",
            DetectorPhase::Completed => "completed",
        }
    }
}

/// Signals produced by the detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectorEvent {
    /// Best-effort partial text for live display
    Update { text: String, busy: bool },
    /// Busy marker appeared
    StreamStarted,
    /// Busy marker disappeared; completion will be attempted after settling
    StreamEnded,
    /// The source finished answering this cycle
    Complete(Response),
    /// The runtime should try to locate the target again
    RescanDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptPath {
    Settle,
    Grace,
    Forced,
    Deferred,
}

/// Completion detector for one source
///
/// Sans-IO: feed it observations and fired timer tokens, collect
/// [`DetectorEvent`]s, and drain [`TimerCommand`]s for the runtime.
#[derive(Debug)]
pub struct CompletionDetector {
    timings: DetectorTimings,
    phase: DetectorPhase,
    last_text: String,
    latest: Option<Observation>,
    busy: bool,
    seen_busy: bool,
    deferred: bool,
    baseline: Option<String>,
    rescan_attempts: u32,
    timers: TimerRegistry,
}

impl CompletionDetector {
    pub fn new(timings: DetectorTimings) -> Self {
        Self {
            timings,
            phase: DetectorPhase::Idle,
            last_text: String::new(),
            latest: None,
            busy: false,
            seen_busy: false,
            deferred: false,
            baseline: None,
            rescan_attempts: 0,
            timers: TimerRegistry::new(),
        }
    }

    // ==================== Accessors ====================

    pub fn phase(&self) -> DetectorPhase {
        self.phase
    }

    pub fn last_text(&self) -> &str {
        &self.last_text
    }

    pub fn is_streaming_busy(&self) -> bool {
        self.busy
    }

    pub fn has_completed_this_cycle(&self) -> bool {
        self.phase == DetectorPhase::Completed
    }

    pub fn generation(&self) -> u64 {
        self.timers.generation()
    }

    pub fn timings(&self) -> &DetectorTimings {
        &self.timings
    }

    /// Drain timer commands queued by the last calls
    pub fn take_timer_commands(&mut self) -> Vec<TimerCommand> {
        self.timers.take_commands()
    }

    // ==================== Cycle lifecycle ====================

    /// Clear all per-cycle state and cancel every pending timer
    pub fn reset(&mut self) {
        self.timers.reset();
        self.phase = DetectorPhase::Idle;
        self.last_text.clear();
        self.latest = None;
        self.busy = false;
        self.seen_busy = false;
        self.deferred = false;
        self.baseline = None;
        self.rescan_attempts = 0;
    }

    /// Record the text already on screen when the cycle starts.
    ///
    /// That text is treated as the previous answer: it produces no update
    /// and is never completed through the no-marker grace path. After a busy
    /// stretch, identical text completes normally.
    pub fn prime(&mut self, baseline: &str) {
        if baseline.trim().is_empty() {
            return;
        }
        self.last_text = baseline.to_string();
        self.baseline = Some(baseline.to_string());
    }

    // ==================== Inputs ====================

    /// Process one observation of the target
    pub fn on_observation(&mut self, observation: Observation) -> Vec<DetectorEvent> {
        let mut events = Vec::new();

        let text_changed = observation.text != self.last_text;
        if text_changed {
            self.last_text = observation.text.clone();
            events.push(DetectorEvent::Update {
                text: observation.text.clone(),
                busy: observation.busy,
            });
        }

        let was_busy = self.busy;
        self.busy = observation.busy;
        let blank = observation.is_blank();
        self.latest = Some(observation);

        if self.phase == DetectorPhase::Completed {
            return events;
        }

        match (was_busy, self.busy) {
            (false, true) => {
                self.phase = DetectorPhase::Streaming;
                self.seen_busy = true;
                self.deferred = false;
                self.timers.cancel(TimerPurpose::Settle);
                self.timers.cancel(TimerPurpose::Grace);
                self.timers
                    .arm_if_idle(TimerPurpose::Safety, self.timings.max_wait);
                events.push(DetectorEvent::StreamStarted);
            }
            (true, false) => {
                self.phase = DetectorPhase::SettlingForCompletion;
                self.timers.cancel(TimerPurpose::Safety);
                self.timers.cancel(TimerPurpose::Retry);
                self.timers.arm(TimerPurpose::Settle, self.timings.settle);
                events.push(DetectorEvent::StreamEnded);
            }
            (true, true) => {}
            (false, false) => {
                if self.deferred {
                    self.attempt(AttemptPath::Deferred, &mut events);
                } else if text_changed && !self.seen_busy && !blank {
                    self.phase = DetectorPhase::SettlingForCompletion;
                    self.timers.arm(TimerPurpose::Grace, self.timings.grace);
                }
            }
        }

        events
    }

    /// Process a fired timer; stale tokens are ignored
    pub fn on_timer(&mut self, token: TimerToken) -> Vec<DetectorEvent> {
        let mut events = Vec::new();
        if !self.timers.fire(token) {
            return events;
        }

        match token.purpose {
            TimerPurpose::Settle => self.attempt(AttemptPath::Settle, &mut events),
            TimerPurpose::Grace => self.attempt(AttemptPath::Grace, &mut events),
            TimerPurpose::Safety | TimerPurpose::Retry => {
                if self.busy {
                    self.timers.arm(TimerPurpose::Retry, self.timings.retry);
                } else {
                    self.attempt(AttemptPath::Forced, &mut events);
                }
            }
            TimerPurpose::Rescan => events.push(DetectorEvent::RescanDue),
            TimerPurpose::AutoMergeTimeout | TimerPurpose::SinkSubmit => {}
        }

        events
    }

    /// The target could not be located.
    ///
    /// Schedules another lookup unless the attempt budget for this cycle is
    /// spent. Returns `false` once the detector has given up.
    pub fn on_target_lost(&mut self) -> bool {
        if self.rescan_attempts >= self.timings.rescan_attempts {
            return false;
        }
        self.rescan_attempts += 1;
        self.timers
            .arm_if_idle(TimerPurpose::Rescan, self.timings.rescan_interval);
        true
    }

    /// The target was located again
    pub fn on_target_found(&mut self) {
        self.rescan_attempts = 0;
        self.timers.cancel(TimerPurpose::Rescan);
    }

    // ==================== Completion ====================

    fn attempt(&mut self, path: AttemptPath, events: &mut Vec<DetectorEvent>) {
        if self.phase == DetectorPhase::Completed {
            return;
        }

        if self.busy {
            // Marker came back while settling; wait for the next busy→idle
            self.phase = DetectorPhase::Streaming;
            return;
        }

        // A busy stretch proves a new answer; without one, the previous text is not it
        let ready = self
            .latest
            .as_ref()
            .filter(|obs| !obs.is_blank())
            .filter(|obs| {
                self.seen_busy || self.baseline.as_deref() != Some(obs.text.as_str())
            });

        let Some(observation) = ready else {
            if path == AttemptPath::Grace {
                self.phase = DetectorPhase::Idle;
            } else {
                self.phase = DetectorPhase::SettlingForCompletion;
                self.deferred = true;
            }
            return;
        };

        let response = observation.to_response();
        self.phase = DetectorPhase::Completed;
        self.deferred = false;
        self.timers.cancel_all();
        events.push(DetectorEvent::Complete(response));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn detector() -> CompletionDetector {
        CompletionDetector::new(DetectorTimings::default())
    }

    /// Token most recently armed for `purpose`
    fn armed(detector: &mut CompletionDetector, purpose: TimerPurpose) -> TimerToken {
        detector
            .take_timer_commands()
            .into_iter()
            .rev()
            .find_map(|cmd| match cmd {
                TimerCommand::Arm { token, .. } if token.purpose == purpose => Some(token),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no {} timer armed", purpose))
    }

    fn completions(events: &[DetectorEvent]) -> Vec<&Response> {
        events
            .iter()
            .filter_map(|e| match e {
                DetectorEvent::Complete(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_update_only_on_text_change() {
        let mut d = detector();
        let events = d.on_observation(Observation::new("Par", true));
        assert!(events.contains(&DetectorEvent::Update {
            text: "Par".to_string(),
            busy: true
        }));

        let events = d.on_observation(Observation::new("Par", true));
        assert!(events.is_empty());
    }

    #[test]
    fn test_marker_path_completes_after_settle() {
        let mut d = detector();
        d.on_observation(Observation::new("", true));
        assert_eq!(d.phase(), DetectorPhase::Streaming);
        d.take_timer_commands();

        d.on_observation(Observation::new("Paris", true));
        let events = d.on_observation(Observation::new("Paris", false));
        assert!(events.contains(&DetectorEvent::StreamEnded));
        assert_eq!(d.phase(), DetectorPhase::SettlingForCompletion);

        let settle = armed(&mut d, TimerPurpose::Settle);
        let events = d.on_timer(settle);
        let done = completions(&events);
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].text, "Paris");
        assert!(d.has_completed_this_cycle());
    }

    #[test]
    fn test_settle_rejected_when_marker_reappears() {
        let mut d = detector();
        d.on_observation(Observation::new("Par", true));
        d.on_observation(Observation::new("Par", false));
        let settle = armed(&mut d, TimerPurpose::Settle);

        // Marker flickers back on before the settle delay elapses
        d.on_observation(Observation::new("Paris", true));
        let events = d.on_timer(settle);
        assert!(completions(&events).is_empty());
        assert_eq!(d.phase(), DetectorPhase::Streaming);

        d.on_observation(Observation::new("Paris", false));
        let settle = armed(&mut d, TimerPurpose::Settle);
        let events = d.on_timer(settle);
        assert_eq!(completions(&events)[0].text, "Paris");
    }

    #[test]
    fn test_complete_fires_at_most_once() {
        let mut d = detector();
        d.on_observation(Observation::new("a", true));
        d.on_observation(Observation::new("a", false));
        let settle = armed(&mut d, TimerPurpose::Settle);
        assert_eq!(completions(&d.on_timer(settle)).len(), 1);

        // Another full busy cycle after completion is a no-op
        d.on_observation(Observation::new("ab", true));
        d.on_observation(Observation::new("abc", false));
        assert!(d.take_timer_commands().is_empty());
        assert!(completions(&d.on_timer(settle)).is_empty());
        assert!(d.has_completed_this_cycle());
    }

    #[test]
    fn test_updates_continue_after_completion() {
        let mut d = detector();
        d.on_observation(Observation::new("a", true));
        d.on_observation(Observation::new("a", false));
        let settle = armed(&mut d, TimerPurpose::Settle);
        d.on_timer(settle);

        let events = d.on_observation(Observation::new("a!", false));
        assert_eq!(
            events,
            vec![DetectorEvent::Update {
                text: "a!".to_string(),
                busy: false
            }]
        );
    }

    #[test]
    fn test_empty_text_defers_until_next_observation() {
        let mut d = detector();
        d.on_observation(Observation::new("", true));
        d.on_observation(Observation::new("", false));
        let settle = armed(&mut d, TimerPurpose::Settle);

        let events = d.on_timer(settle);
        assert!(completions(&events).is_empty());
        assert_eq!(d.phase(), DetectorPhase::SettlingForCompletion);

        let events = d.on_observation(Observation::new("Paris, France", false));
        assert_eq!(completions(&events)[0].text, "Paris, France");
    }

    #[test]
    fn test_safety_timeout_retries_while_busy() {
        let mut d = detector();
        d.on_observation(Observation::new("long answer", true));
        let safety = armed(&mut d, TimerPurpose::Safety);

        let events = d.on_timer(safety);
        assert!(completions(&events).is_empty());
        let retry = armed(&mut d, TimerPurpose::Retry);

        let events = d.on_timer(retry);
        assert!(completions(&events).is_empty());
        let retry = armed(&mut d, TimerPurpose::Retry);

        // Marker finally clears: the busy→idle path takes over
        d.on_observation(Observation::new("long answer.", false));
        assert!(d.on_timer(retry).is_empty());
        let settle = armed(&mut d, TimerPurpose::Settle);
        assert_eq!(completions(&d.on_timer(settle)).len(), 1);
    }

    #[test]
    fn test_safety_armed_once_per_busy_stretch() {
        let mut d = detector();
        d.on_observation(Observation::new("a", true));
        let commands = d.take_timer_commands();
        let arm = commands
            .iter()
            .find_map(|c| match c {
                TimerCommand::Arm { token, after } if token.purpose == TimerPurpose::Safety => {
                    Some(*after)
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(arm, Duration::from_secs(30));

        d.on_observation(Observation::new("ab", true));
        assert!(d.take_timer_commands().is_empty());
    }

    #[test]
    fn test_grace_path_without_marker() {
        let mut d = detector();
        d.on_observation(Observation::new("Paris", false));
        assert_eq!(d.phase(), DetectorPhase::SettlingForCompletion);
        let grace = armed(&mut d, TimerPurpose::Grace);

        let events = d.on_timer(grace);
        assert_eq!(completions(&events)[0].text, "Paris");
    }

    #[test]
    fn test_grace_window_restarts_on_each_change() {
        let mut d = detector();
        d.on_observation(Observation::new("The", false));
        let first = armed(&mut d, TimerPurpose::Grace);
        d.on_observation(Observation::new("The capital", false));
        let second = armed(&mut d, TimerPurpose::Grace);

        assert!(d.on_timer(first).is_empty());
        assert_eq!(
            completions(&d.on_timer(second))[0].text,
            "The capital"
        );
    }

    #[test]
    fn test_marker_appearing_cancels_grace() {
        let mut d = detector();
        d.on_observation(Observation::new("P", false));
        let grace = armed(&mut d, TimerPurpose::Grace);
        d.on_observation(Observation::new("Pa", true));

        assert!(d.on_timer(grace).is_empty());
        assert_eq!(d.phase(), DetectorPhase::Streaming);
    }

    #[test]
    fn test_reset_discards_stale_timers() {
        let mut d = detector();
        d.on_observation(Observation::new("old", true));
        d.on_observation(Observation::new("old", false));
        let settle = armed(&mut d, TimerPurpose::Settle);

        d.reset();
        assert_eq!(d.phase(), DetectorPhase::Idle);
        assert_eq!(d.last_text(), "");
        assert!(!d.is_streaming_busy());
        assert!(d.on_timer(settle).is_empty());
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut d = detector();
        d.on_observation(Observation::new("x", true));
        d.reset();
        d.take_timer_commands();
        d.reset();
        assert!(d.take_timer_commands().is_empty());
        assert_eq!(d.phase(), DetectorPhase::Idle);
    }

    #[test]
    fn test_primed_baseline_blocks_grace_path() {
        let mut d = detector();
        d.prime("previous answer");

        // Stale answer still on screen produces nothing
        assert!(d.on_observation(Observation::new("previous answer", false)).is_empty());
        assert!(d.take_timer_commands().is_empty());

        // Text flickers back to the old answer without a marker
        d.on_observation(Observation::new("previous", false));
        d.on_observation(Observation::new("previous answer", false));
        let grace = armed(&mut d, TimerPurpose::Grace);
        assert!(completions(&d.on_timer(grace)).is_empty());

        d.on_observation(Observation::new("new answer", false));
        let grace = armed(&mut d, TimerPurpose::Grace);
        assert_eq!(completions(&d.on_timer(grace))[0].text, "new answer");
    }

    #[test]
    fn test_repeated_answer_completes_after_busy_stretch() {
        let mut d = detector();
        d.prime("4");

        d.on_observation(Observation::new("", true));
        d.on_observation(Observation::new("4", true));
        d.on_observation(Observation::new("4", false));
        let settle = armed(&mut d, TimerPurpose::Settle);

        let events = d.on_timer(settle);
        assert_eq!(completions(&events)[0].text, "4");
        assert!(d.has_completed_this_cycle());
    }

    #[test]
    fn test_rescan_budget() {
        let timings = DetectorTimings {
            rescan_attempts: 2,
            ..DetectorTimings::default()
        };
        let mut d = CompletionDetector::new(timings);
        assert!(d.on_target_lost());
        let rescan = armed(&mut d, TimerPurpose::Rescan);
        assert_eq!(d.on_timer(rescan), vec![DetectorEvent::RescanDue]);
        assert!(d.on_target_lost());
        assert!(!d.on_target_lost());

        d.on_target_found();
        assert!(d.on_target_lost());
    }

    #[test]
    fn test_completion_captures_latest_markup() {
        let mut d = detector();
        d.on_observation(Observation::new("x", true));
        d.on_observation(
            Observation::new("x", false)
                .with_markup("<p>x</p>")
                .with_selector("response-1"),
        );
        let settle = armed(&mut d, TimerPurpose::Settle);
        let events = d.on_timer(settle);
        let response = completions(&events)[0];
        assert_eq!(response.raw_markup, "<p>x</p>");
        assert_eq!(response.origin_selector_id.as_deref(), Some("response-1"));
    }
}
