//! Engine configuration container.
//!
//! [`EngineConfig`] groups everything the [`QuorumEngine`](crate::QuorumEngine)
//! needs at start-up. Only the merge settings and the layout are mutable at
//! runtime (through engine commands); timings and selectors are fixed.

use polyquorum_domain::{DetectorTimings, MergeSettings, Provider, SelectorConfig, SlotLayout};
use std::collections::HashMap;

/// Per-provider selector overrides, keyed by provider key (`"chatgpt"`, ...)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorCatalog {
    overrides: HashMap<String, SelectorConfig>,
}

impl SelectorCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, provider: &Provider, selectors: SelectorConfig) -> Self {
        self.insert(provider, selectors);
        self
    }

    pub fn insert(&mut self, provider: &Provider, selectors: SelectorConfig) {
        self.overrides
            .insert(provider.as_str().to_lowercase(), selectors);
    }

    /// Selectors for `provider`: the override if one is set, else the built-in defaults
    pub fn selectors_for(&self, provider: &Provider) -> SelectorConfig {
        self.overrides
            .get(&provider.as_str().to_lowercase())
            .filter(|s| !s.is_empty())
            .cloned()
            .unwrap_or_else(|| SelectorConfig::defaults_for(provider))
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

/// Configuration for one engine instance
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub merge: MergeSettings,
    pub timings: DetectorTimings,
    pub layout: SlotLayout,
    pub selectors: SelectorCatalog,
}

impl EngineConfig {
    pub fn new(merge: MergeSettings) -> Self {
        Self {
            merge,
            ..Default::default()
        }
    }

    pub fn with_timings(mut self, timings: DetectorTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_layout(mut self, layout: SlotLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_selectors(mut self, selectors: SelectorCatalog) -> Self {
        self.selectors = selectors;
        self
    }
}
