//! Provider value object representing the agent mounted in a slot

use super::error::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Conversational agent hosted in a slot (Value Object)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Provider {
    ChatGpt,
    Gemini,
    Perplexity,
    Claude,
    Custom(String),
}

impl Provider {
    /// Get the string key for this provider
    pub fn as_str(&self) -> &str {
        match self {
            Provider::ChatGpt => "chatgpt",
            Provider::Gemini => "gemini",
            Provider::Perplexity => "perplexity",
            Provider::Claude => "claude",
            Provider::Custom(s) => s,
        }
    }

    /// Name shown to users and used in citation window mappings
    pub fn display_name(&self) -> &str {
        match self {
            Provider::ChatGpt => "ChatGPT",
            Provider::Gemini => "Gemini",
            Provider::Perplexity => "Perplexity",
            Provider::Claude => "Claude",
            Provider::Custom(s) => s,
        }
    }

    /// Parse a configured provider key; blank keys are rejected
    pub fn from_key(key: &str) -> Result<Provider, DomainError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(DomainError::InvalidProvider(
                "provider key cannot be empty".to_string(),
            ));
        }
        let Ok(provider) = key.parse::<Provider>();
        Ok(provider)
    }

    /// The built-in providers
    pub fn builtin() -> Vec<Provider> {
        vec![
            Provider::ChatGpt,
            Provider::Gemini,
            Provider::Perplexity,
            Provider::Claude,
        ]
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "chatgpt" => Provider::ChatGpt,
            "gemini" => Provider::Gemini,
            "perplexity" => Provider::Perplexity,
            "claude" => Provider::Claude,
            _ => Provider::Custom(s.to_string()),
        })
    }
}

impl Serialize for Provider {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Provider {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let Ok(provider) = s.parse::<Provider>();
        Ok(provider)
    }
}
