//! Tile set builder, the exclusive import path

use std::collections::{BTreeMap, HashMap};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::format::{Header, BLOB_ENTRY_SIZE, COORD_ENTRY_SIZE, HEADER_SIZE};
use crate::model::{TileCoord, TileId, TileSetMeta};
use crate::{Error, Result};

/// Counters reported by [`TileSetBuilder::finish`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Coordinates recorded
    pub tiles: u64,
    /// Distinct blobs stored after dedup
    pub blobs: u64,
    /// Bytes of blob data written
    pub bytes: u64,
}

struct BuilderState {
    writer: BufWriter<File>,
    offset: u64,
    blobs: HashMap<TileId, (u64, u32)>,
    coords: BTreeMap<u64, TileId>,
}

/// Writes a new tile set file
///
/// Import runs exclusively: all mutation is serialized through one lock, so
/// writers racing on the same new content cannot store it twice. Blob data
/// is appended as it arrives; the indexes and metadata are written by
/// `finish`, and the file only becomes a valid tile set once `finish` has
/// patched the header.
pub struct TileSetBuilder {
    path: PathBuf,
    meta: TileSetMeta,
    state: Mutex<BuilderState>,
}

impl TileSetBuilder {
    /// Create a new tile set file, truncating any existing one
    pub fn create(path: impl AsRef<Path>, meta: TileSetMeta) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);
        // Placeholder header; finish() rewrites it with the real offsets.
        writer.write_all(&[0u8; HEADER_SIZE as usize])?;

        Ok(TileSetBuilder {
            path,
            meta,
            state: Mutex::new(BuilderState {
                writer,
                offset: HEADER_SIZE,
                blobs: HashMap::new(),
                coords: BTreeMap::new(),
            }),
        })
    }

    /// Store tile bytes, or reuse the existing copy of identical content
    ///
    /// Deterministic and order-independent: the same bytes always yield the
    /// same id and at most one physical copy per tile set.
    pub fn put_blob(&self, data: &[u8]) -> Result<TileId> {
        if data.len() > u32::MAX as usize {
            return Err(Error::BadFormat("blob exceeds the 4 GiB record limit".into()));
        }
        let id = TileId::digest(data);

        let mut state = self.state.lock();
        if !state.blobs.contains_key(&id) {
            let offset = state.offset;
            state.writer.write_all(data)?;
            state.offset += data.len() as u64;
            state.blobs.insert(id, (offset, data.len() as u32));
        }
        Ok(id)
    }

    /// Store tile bytes and record them at a coordinate
    ///
    /// Writing the same coordinate twice keeps the later content.
    pub fn put_tile(&self, coord: TileCoord, data: &[u8]) -> Result<TileId> {
        let id = self.put_blob(data)?;
        self.state.lock().coords.insert(coord.key(), id);
        Ok(id)
    }

    /// Path of the file being built
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write both indexes and the metadata block, then the final header
    pub fn finish(self) -> Result<BuildStats> {
        let TileSetBuilder { meta, state, .. } = self;
        let BuilderState {
            mut writer,
            offset,
            blobs,
            coords,
        } = state.into_inner();

        let blob_index_offset = offset;
        let mut entries: Vec<_> = blobs.into_iter().collect();
        entries.sort_by_key(|(id, _)| *id.as_bytes());
        for (id, (blob_offset, blob_len)) in &entries {
            writer.write_all(id.as_bytes())?;
            writer.write_all(&blob_offset.to_le_bytes())?;
            writer.write_all(&blob_len.to_le_bytes())?;
        }

        let coord_index_offset = blob_index_offset + (entries.len() * BLOB_ENTRY_SIZE) as u64;
        for (key, id) in &coords {
            writer.write_all(&key.to_le_bytes())?;
            writer.write_all(id.as_bytes())?;
        }

        let meta_offset = coord_index_offset + (coords.len() * COORD_ENTRY_SIZE) as u64;
        let meta_json = meta.to_json()?;
        writer.write_all(&meta_json)?;

        let header = Header {
            tile_count: coords.len() as u64,
            blob_count: entries.len() as u64,
            blob_index_offset,
            coord_index_offset,
            meta_offset,
            meta_len: meta_json.len() as u32,
        };

        writer.flush()?;
        let mut file = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&header.encode())?;
        file.sync_all()?;

        Ok(BuildStats {
            tiles: header.tile_count,
            blobs: header.blob_count,
            bytes: blob_index_offset - HEADER_SIZE,
        })
    }
}
