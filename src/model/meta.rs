//! Tile set metadata block

use serde::{Deserialize, Serialize};

use crate::Result;

/// Descriptive metadata persisted inside a tile set file
///
/// Carries the facts a serving front end wants without opening the blobs:
/// what the tile set is, what image format its tiles use, and which zoom
/// level it covers. Every field is optional and the engine itself never
/// interprets any of them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSetMeta {
    /// Human-readable tile set name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Image format of the stored tiles, e.g. "png" or "jpeg"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Zoom level this tile set covers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zoom: Option<u32>,
}

impl TileSetMeta {
    /// Serialize to the JSON block stored in the file
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse the JSON block stored in the file
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
