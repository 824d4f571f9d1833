//! Detector configuration from TOML (`[detector]` section)

use super::ConfigValidationError;
use polyquorum_domain::DetectorTimings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw detector timings from TOML, in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDetectorConfig {
    pub settle_ms: u64,
    pub max_wait_ms: u64,
    pub retry_ms: u64,
    pub grace_ms: u64,
    pub rescan_interval_ms: u64,
    pub rescan_attempts: u32,
}

impl Default for FileDetectorConfig {
    fn default() -> Self {
        let t = DetectorTimings::default();
        Self {
            settle_ms: t.settle.as_millis() as u64,
            max_wait_ms: t.max_wait.as_millis() as u64,
            retry_ms: t.retry.as_millis() as u64,
            grace_ms: t.grace.as_millis() as u64,
            rescan_interval_ms: t.rescan_interval.as_millis() as u64,
            rescan_attempts: t.rescan_attempts,
        }
    }
}

impl FileDetectorConfig {
    /// Every duration must be positive
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let fields = [
            ("settle_ms", self.settle_ms),
            ("max_wait_ms", self.max_wait_ms),
            ("retry_ms", self.retry_ms),
            ("grace_ms", self.grace_ms),
            ("rescan_interval_ms", self.rescan_interval_ms),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(ConfigValidationError::ZeroDuration(*name)),
            None => Ok(()),
        }
    }

    pub fn to_timings(&self) -> DetectorTimings {
        DetectorTimings {
            settle: Duration::from_millis(self.settle_ms),
            max_wait: Duration::from_millis(self.max_wait_ms),
            retry: Duration::from_millis(self.retry_ms),
            grace: Duration::from_millis(self.grace_ms),
            rescan_interval: Duration::from_millis(self.rescan_interval_ms),
            rescan_attempts: self.rescan_attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_domain() {
        assert_eq!(
            FileDetectorConfig::default().to_timings(),
            DetectorTimings::default()
        );
    }

    #[test]
    fn test_zero_duration_rejected() {
        let config = FileDetectorConfig {
            grace_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ZeroDuration("grace_ms"))
        );
    }
}
