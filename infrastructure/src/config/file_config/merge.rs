//! Merge configuration from TOML (`[merge]` section)

use super::ConfigValidationError;
use polyquorum_domain::{MergeSettings, MergeTimeout, SlotId};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw merge configuration from TOML
///
/// ```toml
/// [merge]
/// aggregation = true
/// sink = "bottomRight"
/// timeout_seconds = 120   # 0 = disabled, -1 = wait forever
/// auto_merge = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMergeConfig {
    /// Merge answers into the sink slot
    pub aggregation: bool,
    /// Slot that receives the synthesis request
    pub sink: String,
    /// Early-merge timeout after the first completion
    pub timeout_seconds: i64,
    /// Merge automatically once every source completed
    pub auto_merge: bool,
    /// Delay between injecting the synthesis request and submitting it
    pub sink_submit_delay_ms: u64,
}

impl Default for FileMergeConfig {
    fn default() -> Self {
        let defaults = MergeSettings::default();
        Self {
            aggregation: defaults.aggregation_enabled,
            sink: defaults.sink.as_str().to_string(),
            timeout_seconds: defaults.timeout.as_seconds(),
            auto_merge: defaults.auto_merge,
            sink_submit_delay_ms: defaults.sink_submit_delay.as_millis() as u64,
        }
    }
}

impl FileMergeConfig {
    pub fn parse_sink(&self) -> Result<SlotId, ConfigValidationError> {
        self.sink
            .parse()
            .map_err(|_| ConfigValidationError::InvalidSink(self.sink.clone()))
    }

    pub fn parse_timeout(&self) -> Result<MergeTimeout, ConfigValidationError> {
        MergeTimeout::from_seconds(self.timeout_seconds)
            .map_err(|_| ConfigValidationError::InvalidTimeout(self.timeout_seconds))
    }

    /// Convert to domain settings
    pub fn to_settings(&self) -> Result<MergeSettings, ConfigValidationError> {
        let mut settings = MergeSettings::default()
            .with_aggregation(self.aggregation)
            .with_sink(self.parse_sink()?)
            .with_timeout(self.parse_timeout()?)
            .with_auto_merge(self.auto_merge);
        settings.sink_submit_delay = Duration::from_millis(self.sink_submit_delay_ms);
        Ok(settings)
    }
}
