//! Status reporting while a scenario runs

pub mod reporter;
