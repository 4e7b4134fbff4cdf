//! tilestore CLI - build and inspect tile set files
//!
//! The serving read path is a library concern; this binary covers the
//! import side (building finished tile sets from a directory of images)
//! and operational inspection of existing files.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tilestore::{TileCoord, TileId, TileSet, TileSetBuilder, TileSetMeta};

#[derive(Parser)]
#[command(name = "tilestore")]
#[command(about = "A content-addressed storage engine for map tile sets")]
#[command(version)]
struct Cli {
    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a tile set from a directory laid out as <x>/<y>.<ext>
    Build {
        /// Source directory of tile images
        source: PathBuf,
        /// Output tile set file
        #[arg(short, long)]
        output: PathBuf,
        /// Tile set name recorded in the metadata block
        #[arg(long)]
        name: Option<String>,
        /// Image format recorded in the metadata block (e.g. png)
        #[arg(long)]
        image_format: Option<String>,
        /// Zoom level recorded in the metadata block
        #[arg(long)]
        zoom: Option<u32>,
    },

    /// Show header counts and metadata
    Info {
        /// Tile set file
        tileset: PathBuf,
    },

    /// Translate a coordinate to its tile id
    Lookup {
        /// Tile set file
        tileset: PathBuf,
        x: u32,
        y: u32,
    },

    /// Fetch tile bytes by coordinate
    Get {
        /// Tile set file
        tileset: PathBuf,
        x: u32,
        y: u32,
        /// Write bytes here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fetch tile bytes by id
    Cat {
        /// Tile set file
        tileset: PathBuf,
        /// Tile id in its 27-character text form
        id: String,
        /// Write bytes here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Recompute every stored blob's digest
    Verify {
        /// Tile set file
        tileset: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            source,
            output: out_path,
            name,
            image_format,
            zoom,
        } => {
            let meta = TileSetMeta {
                name,
                format: image_format,
                zoom,
            };
            let builder = TileSetBuilder::create(&out_path, meta)?;
            let imported = import_tree(&builder, &source)?;
            let stats = builder.finish()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "tileset": out_path.display().to_string(),
                    "imported": imported,
                    "tiles": stats.tiles,
                    "blobs": stats.blobs,
                    "bytes": stats.bytes
                }),
            );
        }

        Commands::Info { tileset } => {
            let tiles = TileSet::open(&tileset)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "tileset": tileset.display().to_string(),
                    "tiles": tiles.tile_count(),
                    "blobs": tiles.blob_count(),
                    "meta": tiles.meta()
                }),
            );
        }

        Commands::Lookup { tileset, x, y } => {
            let tiles = TileSet::open(&tileset)?;
            let id = tiles.lookup(TileCoord::new(x, y))?;
            output(
                &cli.format,
                &serde_json::json!({
                    "x": x,
                    "y": y,
                    "id": id.map(|id| id.to_base64())
                }),
            );
        }

        Commands::Get {
            tileset,
            x,
            y,
            output: out_path,
        } => {
            let tiles = TileSet::open(&tileset)?;
            match tiles.get_tile(TileCoord::new(x, y))? {
                Some(data) => write_bytes(data, out_path.as_deref())?,
                None => anyhow::bail!("no tile at ({}, {})", x, y),
            }
        }

        Commands::Cat {
            tileset,
            id,
            output: out_path,
        } => {
            let id = TileId::from_base64(&id)?;
            let tiles = TileSet::open(&tileset)?;
            let data = tiles.fetch(&id)?;
            write_bytes(data, out_path.as_deref())?;
        }

        Commands::Verify { tileset } => {
            let tiles = TileSet::open(&tileset)?;
            tiles.verify_all()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "blobs": tiles.blob_count()
                }),
            );
        }
    }

    Ok(())
}

/// Import every `<x>/<y>.<ext>` image under `source`
///
/// Entries that don't parse as grid coordinates are skipped, so stray
/// files (directory metadata, checksums) don't abort an import.
fn import_tree(builder: &TileSetBuilder, source: &Path) -> anyhow::Result<u64> {
    let mut imported = 0u64;

    let dir = fs::read_dir(source)
        .with_context(|| format!("reading tile directory {}", source.display()))?;
    for x_entry in dir {
        let x_entry = x_entry?;
        if !x_entry.file_type()?.is_dir() {
            continue;
        }
        let x = match x_entry.file_name().to_str().and_then(|s| s.parse().ok()) {
            Some(x) => x,
            None => continue,
        };

        for y_entry in fs::read_dir(x_entry.path())? {
            let y_entry = y_entry?;
            if !y_entry.file_type()?.is_file() {
                continue;
            }
            let y = match y_entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.parse().ok())
            {
                Some(y) => y,
                None => continue,
            };

            let data = fs::read(y_entry.path())
                .with_context(|| format!("reading {}", y_entry.path().display()))?;
            builder.put_tile(TileCoord::new(x, y), &data)?;
            imported += 1;
        }
    }

    Ok(imported)
}

fn write_bytes(data: &[u8], out_path: Option<&Path>) -> anyhow::Result<()> {
    match out_path {
        Some(path) => {
            fs::write(path, data).with_context(|| format!("writing {}", path.display()))?
        }
        None => std::io::stdout().write_all(data)?,
    }
    Ok(())
}

fn output(format: &OutputFormat, value: &serde_json::Value) {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(value).unwrap());
        }
        OutputFormat::Text => {
            println!("{}", serde_json::to_string_pretty(value).unwrap());
        }
    }
}
