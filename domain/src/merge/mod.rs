//! Merge coordination: collecting completed answers and synthesizing them.
//!
//! - [`settings::MergeSettings`]: aggregation, sink slot, timeout, auto-merge
//! - [`cycle::Cycle`]: per-question collection state
//! - [`synthesis::SynthesisRequest`]: the citation-annotated merge prompt
//! - [`coordinator::MergeCoordinator`]: the `Idle → Collecting → Merging → Idle` state machine

pub mod coordinator;
pub mod cycle;
pub mod settings;
pub mod synthesis;

pub use coordinator::{CoordinatorEvent, CoordinatorPhase, MergeCoordinator};
pub use cycle::{CollectedResponse, Cycle};
pub use settings::{MergeSettings, MergeTimeout};
pub use synthesis::{Contribution, SynthesisRequest};
