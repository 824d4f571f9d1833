//! Domain layer for polyquorum
//!
//! This crate contains the core state machines, entities, and value objects.
//! It has no dependencies on runtime, infrastructure or presentation concerns:
//! nothing here sleeps, spawns, or performs I/O.
//!
//! # Core Concepts
//!
//! ## Slots and sources
//!
//! Four fixed [`SlotId`]s each host one conversational agent ([`Provider`]).
//! A question is broadcast to the slots picked by [`BroadcastScope`], and each
//! source's answer is observed as a stream of [`Observation`]s.
//!
//! ## Completion detection
//!
//! Sources never announce that they finished. A [`CompletionDetector`] per
//! slot infers it from the busy marker and text changes, emitting exactly one
//! `Complete` per cycle.
//!
//! ## Merge
//!
//! The [`MergeCoordinator`] collects completed answers from every slot except
//! the sink and, at quorum or on timeout, produces a [`SynthesisRequest`]
//! that is injected into the sink.
//!
//! ## Timers
//!
//! Every delay is registered in a [`TimerRegistry`] under a
//! [`TimerPurpose`]. Tokens from a previous cycle are always rejected.

pub mod broadcast;
pub mod config;
pub mod core;
pub mod detection;
pub mod merge;
pub mod source;
pub mod timer;

// Re-export commonly used types
pub use broadcast::BroadcastScope;
pub use config::OutputFormat;
pub use core::{error::DomainError, provider::Provider, question::Question, slot::SlotId};
pub use detection::{CompletionDetector, DetectorEvent, DetectorPhase, DetectorTimings};
pub use merge::{
    CollectedResponse, Contribution, CoordinatorEvent, CoordinatorPhase, Cycle, MergeCoordinator,
    MergeSettings, MergeTimeout, SynthesisRequest,
};
pub use source::{
    layout::SlotLayout, observation::Observation, response::Response, selectors::SelectorConfig,
};
pub use timer::{TimerCommand, TimerPurpose, TimerRegistry, TimerToken};
