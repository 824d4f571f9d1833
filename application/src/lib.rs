//! Application layer for polyquorum
//!
//! This crate contains the engine, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{EngineConfig, SelectorCatalog};
pub use ports::{
    dispatch::{DispatchError, SinkDispatch},
    journal::{CycleEvent, CycleJournal, NoCycleJournal},
    observation::{Extraction, ObservationPort, TargetHandle},
    status::{NoStatus, StatusObserver},
};
pub use use_cases::dispatcher::BroadcastDispatcher;
pub use use_cases::engine::{
    EngineError, EngineEvent, EngineHandle, EngineReport, MergeRecord, QuorumEngine, TimerOwner,
};
pub use use_cases::source_monitor::SourceMonitor;
