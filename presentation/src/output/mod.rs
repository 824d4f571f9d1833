//! Output formatting for engine reports

pub mod console;
pub mod formatter;
