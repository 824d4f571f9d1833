//! Sources: the external agents observed through their text surfaces.
//!
//! - [`observation::Observation`]: one raw sample of a target (text + busy marker)
//! - [`response::Response`]: the captured answer handed to the merge coordinator
//! - [`layout::SlotLayout`]: which provider is mounted in which slot
//! - [`selectors::SelectorConfig`]: provider-specific lookup rules, opaque to the core

pub mod layout;
pub mod observation;
pub mod response;
pub mod selectors;
