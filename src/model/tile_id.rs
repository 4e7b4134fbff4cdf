//! Content-addressed tile identifier

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha1::{Digest, Sha1};
use std::fmt;

use crate::{Error, Result};

/// Raw length of a tile id in bytes (160-bit digest)
pub const TILE_ID_LEN: usize = 20;

/// Length of the canonical text form (base64, no padding)
pub const TILE_ID_TEXT_LEN: usize = 27;

/// A 20-byte content digest identifying one stored tile image
///
/// Two byte-identical tiles always produce the same id, and the store
/// treats equal ids as equal content with no secondary comparison. The
/// canonical text form is 27 characters of URL-safe base64 without padding,
/// suitable for cache keys and URL path segments.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId([u8; TILE_ID_LEN]);

impl TileId {
    /// The zero id, reserved as a corruption sentinel in index records
    pub const ZERO: TileId = TileId([0u8; TILE_ID_LEN]);

    /// Create a tile id from raw bytes
    pub fn from_bytes(bytes: [u8; TILE_ID_LEN]) -> Self {
        TileId(bytes)
    }

    /// Create a tile id from a byte slice, rejecting any other length
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TILE_ID_LEN {
            return Err(Error::InvalidId(format!(
                "expected {} raw bytes, got {}",
                TILE_ID_LEN,
                bytes.len()
            )));
        }
        let mut arr = [0u8; TILE_ID_LEN];
        arr.copy_from_slice(bytes);
        Ok(TileId(arr))
    }

    /// Digest tile bytes into their id
    pub fn digest(data: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(data);
        TileId(hasher.finalize().into())
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; TILE_ID_LEN] {
        &self.0
    }

    /// Canonical 27-character text form
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Parse the canonical text form
    ///
    /// Strings of the wrong length, with padding, or containing characters
    /// outside the alphabet are rejected rather than decoded into garbage.
    pub fn from_base64(s: &str) -> Result<Self> {
        if s.len() != TILE_ID_TEXT_LEN {
            return Err(Error::InvalidId(format!(
                "expected {} characters, got {}",
                TILE_ID_TEXT_LEN,
                s.len()
            )));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| Error::InvalidId(format!("bad encoding: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Get a short prefix for display (first 7 characters)
    pub fn short(&self) -> String {
        self.to_base64()[..7].to_string()
    }

    /// Check if this is the zero id
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; TILE_ID_LEN]
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base64())
    }
}

impl fmt::Debug for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TileId({})", self.short())
    }
}

impl AsRef<[u8]> for TileId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
