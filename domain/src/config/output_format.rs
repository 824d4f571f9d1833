//! Output format value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// How a finished run is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every completed answer followed by the synthesis request
    Full,
    /// Only the synthesis request sent to the sink
    #[default]
    Synthesis,
    /// Machine-readable run report
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Full => "full",
            OutputFormat::Synthesis => "synthesis",
            OutputFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "full" => Ok(OutputFormat::Full),
            "synthesis" => Ok(OutputFormat::Synthesis),
            "json" => Ok(OutputFormat::Json),
            other => Err(DomainError::InvalidOutputFormat(other.to_string())),
        }
    }
}
