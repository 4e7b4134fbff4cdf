//! On-disk tile set layout
//!
//! File format:
//! ```text
//! [HEADER: 64 bytes]
//!   - magic: 8 bytes ("TILESTOR")
//!   - version: 4 bytes (u32 LE)
//!   - flags: 4 bytes
//!   - tile_count: 8 bytes (u64 LE)
//!   - blob_count: 8 bytes (u64 LE)
//!   - blob_index_offset: 8 bytes (u64 LE)
//!   - coord_index_offset: 8 bytes (u64 LE)
//!   - meta_offset: 8 bytes (u64 LE)
//!   - meta_len: 4 bytes (u32 LE)
//!   - reserved: 4 bytes
//!
//! [BLOB DATA: variable]
//!   - tile image bytes, concatenated
//!
//! [BLOB INDEX: blob_count entries]
//!   - (id: 20 bytes, offset: u64 LE, len: u32 LE), sorted by id
//!
//! [COORD INDEX: tile_count entries]
//!   - (key: u64 LE, id: 20 bytes), sorted by key
//!
//! [META: meta_len bytes]
//!   - JSON metadata block
//! ```
//!
//! The sections are contiguous and in this order; `Header::parse` rejects
//! any layout that disagrees with the file length. Both indexes are written
//! sorted at build time so reads are binary searches over fixed-width
//! records directly in the mapping.

use std::ops::Range;

use crate::model::TILE_ID_LEN;
use crate::{Error, Result, MAGIC, VERSION};

/// Fixed header size
pub const HEADER_SIZE: u64 = 64;

/// Size of one blob index record: 20-byte id + u64 offset + u32 len
pub const BLOB_ENTRY_SIZE: usize = TILE_ID_LEN + 8 + 4;

/// Size of one coord index record: u64 key + 20-byte id
pub const COORD_ENTRY_SIZE: usize = 8 + TILE_ID_LEN;

/// Parsed, validated header of a tile set file
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub tile_count: u64,
    pub blob_count: u64,
    pub blob_index_offset: u64,
    pub coord_index_offset: u64,
    pub meta_offset: u64,
    pub meta_len: u32,
}

impl Header {
    /// Encode for writing; flags stay zero in version 1
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[0..8].copy_from_slice(MAGIC);
        buf[8..12].copy_from_slice(&VERSION.to_le_bytes());
        buf[16..24].copy_from_slice(&self.tile_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.blob_count.to_le_bytes());
        buf[32..40].copy_from_slice(&self.blob_index_offset.to_le_bytes());
        buf[40..48].copy_from_slice(&self.coord_index_offset.to_le_bytes());
        buf[48..56].copy_from_slice(&self.meta_offset.to_le_bytes());
        buf[56..60].copy_from_slice(&self.meta_len.to_le_bytes());
        buf
    }

    /// Parse a header from the full mapped file and validate its layout
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE as usize {
            return Err(Error::BadFormat(format!(
                "file too small for header: {} bytes",
                data.len()
            )));
        }
        if &data[0..8] != MAGIC {
            return Err(Error::BadFormat("bad magic bytes".into()));
        }

        let version = u32::from_le_bytes(data[8..12].try_into().unwrap());
        if version != VERSION {
            return Err(Error::VersionMismatch {
                expected: VERSION,
                found: version,
            });
        }

        let header = Header {
            tile_count: u64::from_le_bytes(data[16..24].try_into().unwrap()),
            blob_count: u64::from_le_bytes(data[24..32].try_into().unwrap()),
            blob_index_offset: u64::from_le_bytes(data[32..40].try_into().unwrap()),
            coord_index_offset: u64::from_le_bytes(data[40..48].try_into().unwrap()),
            meta_offset: u64::from_le_bytes(data[48..56].try_into().unwrap()),
            meta_len: u32::from_le_bytes(data[56..60].try_into().unwrap()),
        };
        header.validate(data.len() as u64)?;
        Ok(header)
    }

    /// Check that the sections are contiguous, in order, and exactly fill
    /// the file
    fn validate(&self, file_len: u64) -> Result<()> {
        let blob_index_end = self
            .blob_count
            .checked_mul(BLOB_ENTRY_SIZE as u64)
            .and_then(|n| self.blob_index_offset.checked_add(n))
            .ok_or_else(|| Error::BadFormat("blob index extent overflows".into()))?;
        let coord_index_end = self
            .tile_count
            .checked_mul(COORD_ENTRY_SIZE as u64)
            .and_then(|n| self.coord_index_offset.checked_add(n))
            .ok_or_else(|| Error::BadFormat("coord index extent overflows".into()))?;
        let meta_end = self
            .meta_offset
            .checked_add(self.meta_len as u64)
            .ok_or_else(|| Error::BadFormat("metadata extent overflows".into()))?;

        if self.blob_index_offset < HEADER_SIZE
            || self.coord_index_offset != blob_index_end
            || self.meta_offset != coord_index_end
            || meta_end != file_len
        {
            return Err(Error::BadFormat("inconsistent section offsets".into()));
        }
        Ok(())
    }

    /// Byte range of the blob data section
    pub fn blob_data_range(&self) -> Range<usize> {
        HEADER_SIZE as usize..self.blob_index_offset as usize
    }

    /// Byte range of the blob index section
    pub fn blob_index_range(&self) -> Range<usize> {
        self.blob_index_offset as usize..self.coord_index_offset as usize
    }

    /// Byte range of the coord index section
    pub fn coord_index_range(&self) -> Range<usize> {
        self.coord_index_offset as usize..self.meta_offset as usize
    }

    /// Byte range of the metadata section
    pub fn meta_range(&self) -> Range<usize> {
        self.meta_offset as usize..self.meta_offset as usize + self.meta_len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_header() -> Header {
        Header {
            tile_count: 0,
            blob_count: 0,
            blob_index_offset: HEADER_SIZE,
            coord_index_offset: HEADER_SIZE,
            meta_offset: HEADER_SIZE,
            meta_len: 0,
        }
    }

    #[test]
    fn test_encode_parse_roundtrip() {
        let header = empty_header();
        let file = header.encode().to_vec();
        assert_eq!(Header::parse(&file).unwrap(), header);
    }

    #[test]
    fn test_roundtrip_with_sections() {
        let header = Header {
            tile_count: 3,
            blob_count: 2,
            blob_index_offset: HEADER_SIZE + 10,
            coord_index_offset: HEADER_SIZE + 10 + 2 * BLOB_ENTRY_SIZE as u64,
            meta_offset: HEADER_SIZE + 10 + 2 * BLOB_ENTRY_SIZE as u64 + 3 * COORD_ENTRY_SIZE as u64,
            meta_len: 2,
        };
        let mut file = header.encode().to_vec();
        file.resize(
            (header.meta_offset + header.meta_len as u64) as usize,
            0,
        );
        assert_eq!(Header::parse(&file).unwrap(), header);
    }

    #[test]
    fn test_rejects_short_file() {
        let err = Header::parse(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, Error::BadFormat(_)));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut file = empty_header().encode().to_vec();
        file[0..8].copy_from_slice(b"NOTATILE");
        assert!(matches!(
            Header::parse(&file),
            Err(Error::BadFormat(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut file = empty_header().encode().to_vec();
        file[8..12].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            Header::parse(&file),
            Err(Error::VersionMismatch {
                expected: VERSION,
                found: 99
            })
        ));
    }

    #[test]
    fn test_rejects_inconsistent_offsets() {
        let mut header = empty_header();
        header.blob_count = 5;
        let file = header.encode().to_vec();
        assert!(matches!(
            Header::parse(&file),
            Err(Error::BadFormat(_))
        ));
    }

    #[test]
    fn test_rejects_overflowing_counts() {
        let mut header = empty_header();
        header.tile_count = u64::MAX;
        let file = header.encode().to_vec();
        assert!(matches!(
            Header::parse(&file),
            Err(Error::BadFormat(_))
        ));
    }
}
