//! Source completion detection.
//!
//! Sources never announce that they are done. The [`CompletionDetector`]
//! infers it from a stream of irregular [`Observation`](crate::source::observation::Observation)s:
//!
//! ```text
//!            busy appears                busy disappears
//!   Idle ─────────────────▶ Streaming ─────────────────▶ SettlingForCompletion
//!    │                        ▲    │ safety timeout            │ settle timer
//!    │ text, never busy       │    └──▶ forced attempt ──┐     ▼
//!    └──▶ SettlingForCompletion (grace)  retry while busy ┘  attempt ──▶ Completed
//!                             └──────── busy reappears ◀──────┘
//! ```
//!
//! `Completed` latches until [`CompletionDetector::reset`].

mod detector;
mod timings;

pub use detector::{CompletionDetector, DetectorEvent, DetectorPhase};
pub use timings::DetectorTimings;
