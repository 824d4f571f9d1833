//! Presentation layer for polyquorum
//!
//! This crate contains CLI definitions, output formatters,
//! and status reporters.

pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::Cli;
pub use output::console::ConsoleFormatter;
pub use output::formatter::OutputFormatter;
pub use progress::reporter::{ConsoleStatus, SimpleStatus};
