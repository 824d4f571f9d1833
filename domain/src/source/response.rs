//! Captured source response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source's answer as captured at completion time (Value Object)
///
/// Immutable once captured. A newer capture for the same slot replaces
/// the older one rather than appending to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Extracted plain text
    pub text: String,
    /// Rendered markup the text was extracted from
    pub raw_markup: String,
    /// When the observation was taken
    pub observed_at: DateTime<Utc>,
    /// Which selector matched the response element, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_selector_id: Option<String>,
}

impl Response {
    /// Create a response with only text, stamped now
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw_markup: text.clone(),
            text,
            observed_at: Utc::now(),
            origin_selector_id: None,
        }
    }

    /// Number of characters in the extracted text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
