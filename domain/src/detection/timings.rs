//! Detector timing parameters

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed delays used by the completion detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorTimings {
    /// Wait after the busy marker disappears before attempting completion
    pub settle: Duration,
    /// Longest a busy marker may stay up before a forced attempt
    pub max_wait: Duration,
    /// Interval between forced attempts while the marker is still up
    pub retry: Duration,
    /// Quiet period after a text change with no busy marker ever seen
    pub grace: Duration,
    /// Interval between attempts to re-acquire a lost target
    pub rescan_interval: Duration,
    /// Re-acquisition attempts before giving up for the cycle
    pub rescan_attempts: u32,
}

impl Default for DetectorTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_millis(500),
            max_wait: Duration::from_secs(30),
            retry: Duration::from_secs(2),
            grace: Duration::from_millis(1500),
            rescan_interval: Duration::from_millis(500),
            rescan_attempts: 10,
        }
    }
}
