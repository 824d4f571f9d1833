//! Logging infrastructure: the structured cycle journal.
//!
//! Provides [`JsonlCycleJournal`], a JSONL file writer that implements
//! the [`CycleJournal`](polyquorum_application::CycleJournal) port.

mod jsonl_journal;

pub use jsonl_journal::JsonlCycleJournal;
