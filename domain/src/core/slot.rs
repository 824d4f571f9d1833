//! Slot value object: a fixed window position hosting one source

use super::error::DomainError;
use serde::{Deserialize, Serialize};

/// One of the four fixed positions in the window grid (Value Object)
///
/// Slot order is the grid reading order: top-left, top-right,
/// bottom-left, bottom-right. Citation window numbers and broadcast
/// order both follow it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotId {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SlotId {
    /// All slots in slot order
    pub const ALL: [SlotId; 4] = [
        SlotId::TopLeft,
        SlotId::TopRight,
        SlotId::BottomLeft,
        SlotId::BottomRight,
    ];

    /// Number of slots in the grid
    pub const COUNT: usize = Self::ALL.len();

    /// Stable identifier used in config files and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotId::TopLeft => "topLeft",
            SlotId::TopRight => "topRight",
            SlotId::BottomLeft => "bottomLeft",
            SlotId::BottomRight => "bottomRight",
        }
    }

    /// Human-readable position name
    pub fn display_name(&self) -> &'static str {
        match self {
            SlotId::TopLeft => "Top Left",
            SlotId::TopRight => "Top Right",
            SlotId::BottomLeft => "Bottom Left",
            SlotId::BottomRight => "Bottom Right",
        }
    }

    /// Zero-based position in slot order
    pub fn index(&self) -> usize {
        match self {
            SlotId::TopLeft => 0,
            SlotId::TopRight => 1,
            SlotId::BottomLeft => 2,
            SlotId::BottomRight => 3,
        }
    }
}

impl Default for SlotId {
    /// The bottom-right window receives merged answers unless configured otherwise
    fn default() -> Self {
        SlotId::BottomRight
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SlotId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match normalized.as_str() {
            "topleft" | "tl" => Ok(SlotId::TopLeft),
            "topright" | "tr" => Ok(SlotId::TopRight),
            "bottomleft" | "bl" => Ok(SlotId::BottomLeft),
            "bottomright" | "br" => Ok(SlotId::BottomRight),
            _ => Err(DomainError::UnknownSlot(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_order() {
        let indices: Vec<usize> = SlotId::ALL.iter().map(|s| s.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert!(SlotId::TopLeft < SlotId::BottomRight);
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!("topLeft".parse::<SlotId>().unwrap(), SlotId::TopLeft);
        assert_eq!("bottom-right".parse::<SlotId>().unwrap(), SlotId::BottomRight);
        assert_eq!("top_right".parse::<SlotId>().unwrap(), SlotId::TopRight);
        assert_eq!("BL".parse::<SlotId>().unwrap(), SlotId::BottomLeft);
        assert!("middle".parse::<SlotId>().is_err());
    }

    #[test]
    fn test_serde_uses_camel_case() {
        let json = serde_json::to_string(&SlotId::BottomLeft).unwrap();
        assert_eq!(json, "\"bottomLeft\"");
        let parsed: SlotId = serde_json::from_str("\"topRight\"").unwrap();
        assert_eq!(parsed, SlotId::TopRight);
    }

    #[test]
    fn test_default_is_bottom_right() {
        assert_eq!(SlotId::default(), SlotId::BottomRight);
    }
}
