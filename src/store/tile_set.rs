//! Memory-mapped tile set reader

use std::cmp::Ordering;
use std::fs::File;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use memmap2::Mmap;

use super::format::{Header, BLOB_ENTRY_SIZE, COORD_ENTRY_SIZE, HEADER_SIZE};
use crate::model::{TileCoord, TileId, TileSetMeta, TILE_ID_LEN};
use crate::{Error, Result};

/// Fetch-time integrity checking policy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verify {
    /// Trust the medium; return stored bytes as-is
    #[default]
    Never,
    /// Recompute the digest of every fetched blob and fail on mismatch
    OnFetch,
}

/// Location of one blob within the data section
#[derive(Clone, Copy, Debug)]
struct BlobEntry {
    offset: u64,
    len: u32,
}

/// A read-only, memory-mapped tile set
///
/// One handle serves any number of reader threads: `lookup` and `fetch`
/// only read the immutable, already-validated mapping and need no locking.
/// `close` consumes the handle, so use-after-close and double-close are
/// compile errors; dropping the handle releases the mapping identically.
#[derive(Debug)]
pub struct TileSet {
    path: PathBuf,
    map: Mmap,
    header: Header,
    meta: TileSetMeta,
    verify: Verify,
}

impl TileSet {
    /// Open a tile set with the default policy (no fetch-time verification)
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, Verify::Never)
    }

    /// Open a tile set with an explicit verification policy
    ///
    /// The header and section layout are validated before the handle
    /// exists; on any failure no handle is returned.
    pub fn open_with(path: impl AsRef<Path>, verify: Verify) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound(path.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        let file_len = file.metadata()?.len();
        if file_len < HEADER_SIZE {
            return Err(Error::BadFormat(format!(
                "file too small for header: {} bytes",
                file_len
            )));
        }

        // Safety: tile sets are finished, static files; nothing truncates
        // or rewrites one while a reader holds the mapping.
        let map = unsafe { Mmap::map(&file)? };

        let header = Header::parse(&map)?;
        let meta = if header.meta_len == 0 {
            TileSetMeta::default()
        } else {
            TileSetMeta::from_json(&map[header.meta_range()])?
        };

        Ok(TileSet {
            path,
            map,
            header,
            meta,
            verify,
        })
    }

    /// Translate a coordinate to the id of its tile content
    ///
    /// `Ok(None)` is the ordinary result for an unpopulated coordinate; a
    /// record holding the reserved zero id is reported as corruption
    /// instead of being passed off as absent.
    pub fn lookup(&self, coord: TileCoord) -> Result<Option<TileId>> {
        let index = &self.map[self.header.coord_index_range()];
        let target = coord.key();

        let mut lo = 0usize;
        let mut hi = self.header.tile_count as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let rec = &index[mid * COORD_ENTRY_SIZE..(mid + 1) * COORD_ENTRY_SIZE];
            let key = u64::from_le_bytes(rec[0..8].try_into().unwrap());
            match key.cmp(&target) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    let id = TileId::from_bytes(rec[8..].try_into().unwrap());
                    if id.is_zero() {
                        return Err(Error::BadFormat(format!(
                            "zero tile id record at {}",
                            coord
                        )));
                    }
                    return Ok(Some(id));
                }
            }
        }
        Ok(None)
    }

    /// Fetch stored bytes by id, zero-copy out of the mapping
    pub fn fetch(&self, id: &TileId) -> Result<&[u8]> {
        let entry = self
            .find_blob(id)
            .ok_or_else(|| Error::NotFound(id.to_base64()))?;
        let data = self.blob_bytes(entry)?;
        if self.verify == Verify::OnFetch && TileId::digest(data) != *id {
            return Err(Error::Corruption(format!("digest mismatch for {}", id)));
        }
        Ok(data)
    }

    /// Fetch an owned copy, for callers that need `'static` bytes
    pub fn fetch_owned(&self, id: &TileId) -> Result<Bytes> {
        Ok(Bytes::copy_from_slice(self.fetch(id)?))
    }

    /// Lookup and fetch in one step
    pub fn get_tile(&self, coord: TileCoord) -> Result<Option<&[u8]>> {
        match self.lookup(coord)? {
            Some(id) => Ok(Some(self.fetch(&id)?)),
            None => Ok(None),
        }
    }

    /// Recompute every stored blob's digest against its id
    ///
    /// A full sweep of the data section; the first mismatch fails it.
    pub fn verify_all(&self) -> Result<()> {
        let index = &self.map[self.header.blob_index_range()];
        for rec in index.chunks_exact(BLOB_ENTRY_SIZE) {
            let id = TileId::from_bytes(rec[..TILE_ID_LEN].try_into().unwrap());
            let entry = BlobEntry {
                offset: u64::from_le_bytes(rec[TILE_ID_LEN..TILE_ID_LEN + 8].try_into().unwrap()),
                len: u32::from_le_bytes(rec[TILE_ID_LEN + 8..].try_into().unwrap()),
            };
            let data = self.blob_bytes(entry)?;
            if TileId::digest(data) != id {
                return Err(Error::Corruption(format!("digest mismatch for {}", id)));
            }
        }
        Ok(())
    }

    /// Number of populated coordinates
    pub fn tile_count(&self) -> u64 {
        self.header.tile_count
    }

    /// Number of distinct blobs after dedup
    pub fn blob_count(&self) -> u64 {
        self.header.blob_count
    }

    /// Metadata recorded at build time
    pub fn meta(&self) -> &TileSetMeta {
        &self.meta
    }

    /// Path this tile set was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the mapping and the handle
    ///
    /// Consuming `self` makes double-close and use-after-close compile
    /// errors; plain `drop` is equivalent.
    pub fn close(self) {}

    fn find_blob(&self, id: &TileId) -> Option<BlobEntry> {
        let index = &self.map[self.header.blob_index_range()];

        let mut lo = 0usize;
        let mut hi = self.header.blob_count as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let rec = &index[mid * BLOB_ENTRY_SIZE..(mid + 1) * BLOB_ENTRY_SIZE];
            match rec[..TILE_ID_LEN].cmp(&id.as_bytes()[..]) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => {
                    return Some(BlobEntry {
                        offset: u64::from_le_bytes(
                            rec[TILE_ID_LEN..TILE_ID_LEN + 8].try_into().unwrap(),
                        ),
                        len: u32::from_le_bytes(rec[TILE_ID_LEN + 8..].try_into().unwrap()),
                    });
                }
            }
        }
        None
    }

    /// Bounds-check an index entry against the data section before slicing
    fn blob_bytes(&self, entry: BlobEntry) -> Result<&[u8]> {
        let data = self.header.blob_data_range();
        let end = entry
            .offset
            .checked_add(entry.len as u64)
            .ok_or_else(|| Error::BadFormat("blob extent overflows".into()))?;
        if entry.offset < data.start as u64 || end > data.end as u64 {
            return Err(Error::BadFormat(format!(
                "blob extent {}..{} escapes data section",
                entry.offset, end
            )));
        }
        Ok(&self.map[entry.offset as usize..end as usize])
    }
}
