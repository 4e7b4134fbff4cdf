//! # tilestore
//!
//! A content-addressed storage engine for map tile sets.
//!
//! tilestore maps grid coordinates (x, y) at a fixed zoom level to the bytes
//! of the tile image at that position, storing byte-identical tiles exactly
//! once. Low zoom levels and ocean regions produce large runs of identical
//! imagery, so every tile is addressed by a digest of its bytes and many
//! coordinates may share one stored blob.
//!
//! ## Core Concepts
//!
//! - **Tile set**: one finished, immutable file holding a coordinate index
//!   and a content-addressed blob area
//! - **TileId**: 20-byte digest of a tile's bytes, used both as the dedup
//!   key and as the retrieval handle
//! - **Builder**: the exclusive import path that writes finished files
//! - **Reader**: a memory-mapped handle serving lock-free concurrent lookups
//!
//! ## Example
//!
//! ```ignore
//! use tilestore::{TileCoord, TileSet};
//!
//! let tiles = TileSet::open("osm-z12.tileset")?;
//! if let Some(id) = tiles.lookup(TileCoord::new(2047, 1361))? {
//!     let bytes = tiles.fetch(&id)?;
//! }
//! ```

pub mod model;
pub mod store;

mod error;

pub use error::{Error, Result};
pub use model::{TileCoord, TileId, TileSetMeta};
pub use store::{BuildStats, TileSet, TileSetBuilder, Verify};

/// Tile set format version for compatibility checks
pub const VERSION: u32 = 1;

/// Magic bytes identifying a tile set file
pub const MAGIC: &[u8; 8] = b"TILESTOR";
