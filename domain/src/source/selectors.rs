//! Provider-specific selector configuration
//!
//! The core never interprets selectors; it hands them to the observation
//! port, which knows how to resolve them against a live surface.

use crate::core::provider::Provider;
use serde::{Deserialize, Serialize};

/// Lookup rules for one provider's surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Candidate selectors for the latest response element, tried in order
    pub response: Vec<String>,
    /// Candidate selectors whose presence means "still streaming"
    pub busy_marker: Vec<String>,
    /// Candidate selectors for the input surface
    pub input: Vec<String>,
}

impl SelectorConfig {
    /// Built-in defaults for a provider
    pub fn defaults_for(provider: &Provider) -> Self {
        match provider {
            Provider::ChatGpt => Self::from_lists(
                &["[data-message-author-role=\"assistant\"]:last-of-type .markdown"],
                &["button[data-testid=\"stop-button\"]"],
                &["#prompt-textarea"],
            ),
            Provider::Gemini => Self::from_lists(
                &["message-content:last-of-type .markdown"],
                &["button.stop", "[aria-label=\"Stop response\"]"],
                &["rich-textarea .ql-editor"],
            ),
            Provider::Perplexity => Self::from_lists(
                &["[id^=\"markdown-content\"]:last-of-type"],
                &["button[aria-label=\"Stop\"]"],
                &["textarea[placeholder]"],
            ),
            Provider::Claude => Self::from_lists(
                &["[data-is-streaming] .font-claude-message:last-of-type"],
                &["[data-is-streaming=\"true\"]"],
                &["div[contenteditable=\"true\"]"],
            ),
            Provider::Custom(_) => Self::default(),
        }
    }

    fn from_lists(response: &[&str], busy_marker: &[&str], input: &[&str]) -> Self {
        let owned = |items: &[&str]| -> Vec<String> { items.iter().map(|s| s.to_string()).collect() };
        Self {
            response: owned(response),
            busy_marker: owned(busy_marker),
            input: owned(input),
        }
    }

    /// True if there is nothing to look the response up with
    pub fn is_empty(&self) -> bool {
        self.response.is_empty()
    }
}
