//! Scripted surface
//!
//! An in-memory stand-in for the four agent panes plus a TOML-driven player
//! that renders responses and issues user actions on a timeline.

pub mod player;
pub mod scenario;
pub mod scripted;

pub use player::ScenarioPlayer;
pub use scenario::{Scenario, ScenarioError, ScenarioStep, TimedStep};
pub use scripted::{PaneState, ScriptedSurface, SurfaceAction};
