//! Benchmarks for tile set lookups and fetches

use std::hint::black_box;
use std::path::{Path, PathBuf};

use criterion::{criterion_group, criterion_main, Criterion};
use tilestore::{TileCoord, TileSet, TileSetBuilder, TileSetMeta};

/// Build a 256x256 grid where most tiles dedup down to 64 distinct blobs,
/// roughly the shape of a mid-zoom coastal tile set
fn build_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("bench.tileset");
    let builder = TileSetBuilder::create(&path, TileSetMeta::default()).unwrap();
    for x in 0..256u32 {
        for y in 0..256u32 {
            let data = format!("tile-block-{}-{}", x % 8, y % 8);
            builder
                .put_tile(TileCoord::new(x, y), data.as_bytes())
                .unwrap();
        }
    }
    builder.finish().unwrap();
    path
}

fn lookup_benchmarks(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let path = build_fixture(dir.path());
    let tiles = TileSet::open(&path).unwrap();

    c.bench_function("lookup_hit", |b| {
        b.iter(|| tiles.lookup(black_box(TileCoord::new(131, 77))).unwrap())
    });

    c.bench_function("lookup_absent", |b| {
        b.iter(|| tiles.lookup(black_box(TileCoord::new(9999, 9999))).unwrap())
    });

    let id = tiles.lookup(TileCoord::new(131, 77)).unwrap().unwrap();
    c.bench_function("fetch", |b| b.iter(|| tiles.fetch(black_box(&id)).unwrap()));

    c.bench_function("lookup_then_fetch", |b| {
        b.iter(|| tiles.get_tile(black_box(TileCoord::new(200, 13))).unwrap())
    });
}

criterion_group!(benches, lookup_benchmarks);
criterion_main!(benches);
