//! Per-cycle timer registry.
//!
//! Every time-based suspension in the core (settle delay, safety timeout,
//! retry interval, grace window, target rescan, auto-merge timeout and the
//! delayed sink submit) is registered here under its [`TimerPurpose`].
//! The registry never sleeps: it hands out [`TimerToken`]s and queues
//! [`TimerCommand`]s that the runtime turns into real timers.
//!
//! A fired token is accepted by [`TimerRegistry::fire`] only if it is still
//! the armed token for its purpose. Cancelled, replaced, and
//! previous-generation tokens are rejected, so a late callback can never act
//! on a newer cycle.
//!
//! ```
//! use polyquorum_domain::timer::{TimerPurpose, TimerRegistry};
//! use std::time::Duration;
//!
//! let mut timers = TimerRegistry::new();
//! let stale = timers.arm(TimerPurpose::Settle, Duration::from_millis(500));
//! timers.reset();
//! assert!(!timers.fire(stale));
//! ```

use std::collections::HashMap;
use std::time::Duration;

/// What a timer guards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TimerPurpose {
    /// Delay after busy→idle before attempting completion
    Settle,
    /// Upper bound on a continuously busy stream
    Safety,
    /// Re-attempt after a rejected forced completion
    Retry,
    /// Fallback completion for sources that never show a busy marker
    Grace,
    /// Re-acquire a lost observation target
    Rescan,
    /// Merge early with whatever has completed
    AutoMergeTimeout,
    /// Submit the injected synthesis request to the sink
    SinkSubmit,
}

impl TimerPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerPurpose::Settle => "settle",
            TimerPurpose::Safety => "safety",
            TimerPurpose::Retry => "retry",
            TimerPurpose::Grace => "grace",
            TimerPurpose::Rescan => "rescan",
            TimerPurpose::AutoMergeTimeout => "auto_merge_timeout",
            TimerPurpose::SinkSubmit => "sink_submit",
        }
    }
}

impl std::fmt::Display for TimerPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity of one armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub purpose: TimerPurpose,
    /// Cycle generation the timer was armed in
    pub generation: u64,
    /// Unique per registry, never reused
    pub seq: u64,
}

/// Instruction for the runtime that owns the real clock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Arm { token: TimerToken, after: Duration },
    Cancel(TimerToken),
}

/// Registry of the timers armed for the current cycle
#[derive(Debug, Default)]
pub struct TimerRegistry {
    generation: u64,
    next_seq: u64,
    armed: HashMap<TimerPurpose, TimerToken>,
    commands: Vec<TimerCommand>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cycle generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Arm `purpose`, replacing (and cancelling) any timer already armed for it
    pub fn arm(&mut self, purpose: TimerPurpose, after: Duration) -> TimerToken {
        self.cancel(purpose);
        self.next_seq += 1;
        let token = TimerToken {
            purpose,
            generation: self.generation,
            seq: self.next_seq,
        };
        self.armed.insert(purpose, token);
        self.commands.push(TimerCommand::Arm { token, after });
        token
    }

    /// Arm `purpose` only if nothing is armed for it yet
    pub fn arm_if_idle(&mut self, purpose: TimerPurpose, after: Duration) -> Option<TimerToken> {
        if self.is_armed(purpose) {
            None
        } else {
            Some(self.arm(purpose, after))
        }
    }

    /// Cancel the timer armed for `purpose`, if any
    pub fn cancel(&mut self, purpose: TimerPurpose) -> Option<TimerToken> {
        let token = self.armed.remove(&purpose)?;
        self.commands.push(TimerCommand::Cancel(token));
        Some(token)
    }

    /// Cancel every armed timer
    pub fn cancel_all(&mut self) {
        let mut tokens: Vec<TimerToken> = self.armed.drain().map(|(_, token)| token).collect();
        tokens.sort_by_key(|t| t.seq);
        self.commands
            .extend(tokens.into_iter().map(TimerCommand::Cancel));
    }

    /// Cancel everything and start a new generation
    pub fn reset(&mut self) {
        self.cancel_all();
        self.generation += 1;
    }

    pub fn is_armed(&self, purpose: TimerPurpose) -> bool {
        self.armed.contains_key(&purpose)
    }

    /// Accept a fired token if it is still current, disarming it
    pub fn fire(&mut self, token: TimerToken) -> bool {
        if token.generation != self.generation {
            return false;
        }
        match self.armed.get(&token.purpose) {
            Some(current) if *current == token => {
                self.armed.remove(&token.purpose);
                true
            }
            _ => false,
        }
    }

    /// Drain the commands queued since the last call
    pub fn take_commands(&mut self) -> Vec<TimerCommand> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fire_accepts_current_token_once() {
        let mut timers = TimerRegistry::new();
        let token = timers.arm(TimerPurpose::Settle, MS);
        assert!(timers.fire(token));
        assert!(!timers.fire(token));
        assert!(!timers.is_armed(TimerPurpose::Settle));
    }

    #[test]
    fn test_rearm_invalidates_previous_token() {
        let mut timers = TimerRegistry::new();
        let first = timers.arm(TimerPurpose::Grace, MS);
        let second = timers.arm(TimerPurpose::Grace, MS);
        assert_ne!(first, second);
        assert!(!timers.fire(first));
        assert!(timers.fire(second));
    }

    #[test]
    fn test_reset_rejects_previous_generation() {
        let mut timers = TimerRegistry::new();
        let token = timers.arm(TimerPurpose::Safety, MS);
        timers.reset();
        assert_eq!(timers.generation(), 1);
        assert!(!timers.fire(token));
    }

    #[test]
    fn test_cancel_queues_command() {
        let mut timers = TimerRegistry::new();
        let token = timers.arm(TimerPurpose::Retry, MS);
        timers.cancel(TimerPurpose::Retry);
        let commands = timers.take_commands();
        assert_eq!(
            commands,
            vec![
                TimerCommand::Arm { token, after: MS },
                TimerCommand::Cancel(token)
            ]
        );
        assert!(timers.take_commands().is_empty());
    }

    #[test]
    fn test_rearm_cancels_replaced_timer() {
        let mut timers = TimerRegistry::new();
        let first = timers.arm(TimerPurpose::Settle, MS);
        timers.take_commands();
        timers.arm(TimerPurpose::Settle, MS);
        let commands = timers.take_commands();
        assert_eq!(commands[0], TimerCommand::Cancel(first));
    }

    #[test]
    fn test_arm_if_idle_keeps_existing() {
        let mut timers = TimerRegistry::new();
        let token = timers.arm(TimerPurpose::Safety, MS);
        assert!(timers.arm_if_idle(TimerPurpose::Safety, MS).is_none());
        assert!(timers.fire(token));
    }

    #[test]
    fn test_cancel_all_is_idempotent() {
        let mut timers = TimerRegistry::new();
        timers.arm(TimerPurpose::Settle, MS);
        timers.arm(TimerPurpose::Safety, MS);
        timers.take_commands();
        timers.cancel_all();
        assert_eq!(timers.take_commands().len(), 2);
        timers.cancel_all();
        assert!(timers.take_commands().is_empty());
    }
}
