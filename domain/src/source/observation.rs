//! Raw observation of a source's text surface

use super::response::Response;
use chrono::{DateTime, Utc};

/// One sample of an observation target (Value Object)
///
/// Produced every time the target's content changes. `busy` reports
/// whether the provider's streaming marker was present at sample time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub text: String,
    pub raw_markup: String,
    pub busy: bool,
    pub origin_selector_id: Option<String>,
    pub observed_at: DateTime<Utc>,
}

impl Observation {
    /// Create an observation stamped now
    pub fn new(text: impl Into<String>, busy: bool) -> Self {
        let text = text.into();
        Self {
            raw_markup: text.clone(),
            text,
            busy,
            origin_selector_id: None,
            observed_at: Utc::now(),
        }
    }

    pub fn with_markup(mut self, raw_markup: impl Into<String>) -> Self {
        self.raw_markup = raw_markup.into();
        self
    }

    pub fn with_selector(mut self, selector_id: impl Into<String>) -> Self {
        self.origin_selector_id = Some(selector_id.into());
        self
    }

    /// True if the extracted text carries no content
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Capture this observation as a response
    pub fn to_response(&self) -> Response {
        Response {
            text: self.text.clone(),
            raw_markup: self.raw_markup.clone(),
            observed_at: self.observed_at,
            origin_selector_id: self.origin_selector_id.clone(),
        }
    }
}
