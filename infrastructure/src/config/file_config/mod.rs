//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and application
//! types by [`FileConfig::to_engine_config`].

mod detector;
mod layout;
mod merge;
mod output;

pub use detector::FileDetectorConfig;
pub use layout::FileLayoutConfig;
pub use merge::FileMergeConfig;
pub use output::FileOutputConfig;

use polyquorum_application::{EngineConfig, SelectorCatalog};
use polyquorum_domain::{Provider, SelectorConfig, SlotId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("merge.timeout_seconds must be -1, 0 or positive (got {0})")]
    InvalidTimeout(i64),

    #[error("merge.sink: unknown slot '{0}'")]
    InvalidSink(String),

    #[error("layout.{0}: provider cannot be empty")]
    EmptyProvider(SlotId),

    #[error("detector.{0} must be greater than 0")]
    ZeroDuration(&'static str),

    #[error("selectors.{0}.response must list at least one selector")]
    EmptyResponseSelectors(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Aggregation, sink slot, and merge timing
    pub merge: FileMergeConfig,
    /// Provider mounted in each slot
    pub layout: FileLayoutConfig,
    /// Completion detector timings
    pub detector: FileDetectorConfig,
    /// Per-provider selector overrides, keyed by provider key
    pub selectors: BTreeMap<String, SelectorConfig>,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.merge.parse_sink()?;
        self.merge.parse_timeout()?;
        self.layout.to_layout()?;
        self.detector.validate()?;

        for (provider, selectors) in &self.selectors {
            if selectors.response.iter().all(|s| s.trim().is_empty()) {
                return Err(ConfigValidationError::EmptyResponseSelectors(
                    provider.clone(),
                ));
            }
        }

        Ok(())
    }

    pub fn selector_catalog(&self) -> SelectorCatalog {
        let mut catalog = SelectorCatalog::new();
        for (key, selectors) in &self.selectors {
            if let Ok(provider) = Provider::from_key(key) {
                catalog.insert(&provider, selectors.clone());
            }
        }
        catalog
    }

    /// Validate and convert into the engine configuration
    pub fn to_engine_config(&self) -> Result<EngineConfig, ConfigValidationError> {
        self.validate()?;
        Ok(EngineConfig::new(self.merge.to_settings()?)
            .with_timings(self.detector.to_timings())
            .with_layout(self.layout.to_layout()?)
            .with_selectors(self.selector_catalog()))
    }
}
