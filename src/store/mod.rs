//! Content-addressed tile storage
//!
//! One finished file holds a blob area addressed by content digest and a
//! coordinate index over it. The builder writes such files once, up front;
//! the reader memory-maps them and serves concurrent lookups without
//! locking.

mod builder;
mod format;
mod tile_set;

pub use builder::{BuildStats, TileSetBuilder};
pub use tile_set::{TileSet, Verify};
