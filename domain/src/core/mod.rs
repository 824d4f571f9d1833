//! Core domain concepts shared across all subdomains.
//!
//! - [`slot::SlotId`]: the four fixed window positions
//! - [`provider::Provider`]: which conversational agent is mounted in a slot
//! - [`question::Question`]: a validated question broadcast to the sources
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod provider;
pub mod question;
pub mod slot;
