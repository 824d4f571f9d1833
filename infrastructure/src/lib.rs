//! Infrastructure layer for polyquorum
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file loading, the JSONL
//! cycle journal, and the scripted surface used by the CLI.

pub mod config;
pub mod logging;
pub mod surface;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDetectorConfig, FileLayoutConfig,
    FileMergeConfig, FileOutputConfig,
};
pub use logging::JsonlCycleJournal;
pub use surface::{
    PaneState, Scenario, ScenarioError, ScenarioPlayer, ScenarioStep, ScriptedSurface,
    SurfaceAction, TimedStep,
};
