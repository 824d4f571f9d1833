//! Layout configuration from TOML (`[layout]` section)

use super::ConfigValidationError;
use polyquorum_domain::{Provider, SlotId, SlotLayout};
use serde::{Deserialize, Serialize};

/// Raw slot layout from TOML (provider key per slot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayoutConfig {
    pub top_left: String,
    pub top_right: String,
    pub bottom_left: String,
    pub bottom_right: String,
}

impl Default for FileLayoutConfig {
    fn default() -> Self {
        let layout = SlotLayout::default();
        let key = |slot| layout.provider(slot).as_str().to_string();
        Self {
            top_left: key(SlotId::TopLeft),
            top_right: key(SlotId::TopRight),
            bottom_left: key(SlotId::BottomLeft),
            bottom_right: key(SlotId::BottomRight),
        }
    }
}

impl FileLayoutConfig {
    fn parse(slot: SlotId, key: &str) -> Result<Provider, ConfigValidationError> {
        Provider::from_key(key).map_err(|_| ConfigValidationError::EmptyProvider(slot))
    }

    /// Convert to the domain layout
    pub fn to_layout(&self) -> Result<SlotLayout, ConfigValidationError> {
        Ok(SlotLayout {
            top_left: Self::parse(SlotId::TopLeft, &self.top_left)?,
            top_right: Self::parse(SlotId::TopRight, &self.top_right)?,
            bottom_left: Self::parse(SlotId::BottomLeft, &self.bottom_left)?,
            bottom_right: Self::parse(SlotId::BottomRight, &self.bottom_right)?,
        })
    }
}
