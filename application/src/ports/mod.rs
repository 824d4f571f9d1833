//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod dispatch;
pub mod journal;
pub mod observation;
pub mod status;
