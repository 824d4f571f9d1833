//! Configuration file loading for polyquorum
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `POLYQUORUM_*` environment variables (`__` separates sections)
//! 2. `--config <path>` specified file
//! 3. Project root: `./polyquorum.toml` or `./.polyquorum.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/polyquorum/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDetectorConfig, FileLayoutConfig, FileMergeConfig,
    FileOutputConfig,
};
pub use loader::ConfigLoader;
