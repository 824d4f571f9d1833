//! Application-level configuration.
//!
//! - [`EngineConfig`]: merge settings, detector timings, layout and selectors
//! - [`SelectorCatalog`]: per-provider selector overrides over the built-in defaults

pub mod engine_config;

pub use engine_config::{EngineConfig, SelectorCatalog};
