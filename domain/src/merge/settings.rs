//! Merge settings

use crate::core::error::DomainError;
use crate::core::slot::SlotId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How long to wait after the first completion before merging anyway
///
/// Configured as an integer number of seconds: `0` disables the timer,
/// `-1` waits forever. Neither ever merges implicitly on time; merging
/// then happens only at full quorum (auto-merge) or on a manual trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum MergeTimeout {
    Disabled,
    Infinite,
    After(Duration),
}

impl MergeTimeout {
    pub fn from_seconds(seconds: i64) -> Result<Self, DomainError> {
        match seconds {
            0 => Ok(MergeTimeout::Disabled),
            -1 => Ok(MergeTimeout::Infinite),
            s if s > 0 => Ok(MergeTimeout::After(Duration::from_secs(s as u64))),
            s => Err(DomainError::InvalidTimeout(s)),
        }
    }

    pub fn as_seconds(&self) -> i64 {
        match self {
            MergeTimeout::Disabled => 0,
            MergeTimeout::Infinite => -1,
            MergeTimeout::After(d) => d.as_secs() as i64,
        }
    }

    /// Timer duration, if this setting arms a timer at all
    pub fn duration(&self) -> Option<Duration> {
        match self {
            MergeTimeout::After(d) if !d.is_zero() => Some(*d),
            _ => None,
        }
    }
}

impl TryFrom<i64> for MergeTimeout {
    type Error = DomainError;

    fn try_from(seconds: i64) -> Result<Self, Self::Error> {
        Self::from_seconds(seconds)
    }
}

impl From<MergeTimeout> for i64 {
    fn from(timeout: MergeTimeout) -> Self {
        timeout.as_seconds()
    }
}

impl std::fmt::Display for MergeTimeout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergeTimeout::Disabled => write!(f, "disabled"),
            MergeTimeout::Infinite => write!(f, "infinite"),
            MergeTimeout::After(d) => write!(f, "{}s", d.as_secs()),
        }
    }
}

/// Runtime-mutable merge configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSettings {
    /// Merge answers into the sink at all
    pub aggregation_enabled: bool,
    /// Slot that receives the synthesis request
    pub sink: SlotId,
    /// Early-merge timer after the first completion
    pub timeout: MergeTimeout,
    /// Merge automatically at full quorum
    pub auto_merge: bool,
    /// Delay between injecting the synthesis request and submitting it
    pub sink_submit_delay: Duration,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            aggregation_enabled: false,
            sink: SlotId::BottomRight,
            timeout: MergeTimeout::After(Duration::from_secs(120)),
            auto_merge: true,
            sink_submit_delay: Duration::from_millis(500),
        }
    }
}

impl MergeSettings {
    pub fn with_aggregation(mut self, enabled: bool) -> Self {
        self.aggregation_enabled = enabled;
        self
    }

    pub fn with_sink(mut self, sink: SlotId) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_timeout(mut self, timeout: MergeTimeout) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_auto_merge(mut self, auto_merge: bool) -> Self {
        self.auto_merge = auto_merge;
        self
    }
}
