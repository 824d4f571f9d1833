//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod dispatcher;
pub mod engine;
pub mod source_monitor;
