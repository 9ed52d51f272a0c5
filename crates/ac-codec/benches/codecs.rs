//! Encode/decode benchmarks per codec.
//!
//! Run with: cargo bench -p ac-codec

use ac_codec::payload::CodecTag;
use ac_codec::registry::{DecoderRegistry, encode_payload};
use ac_core::charset::PALETTE_AUTO;
use ac_core::{CodecConfig, Grid};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Mostly blank frame with a diagonal and a textured band.
fn sparse_frame(width: usize, height: usize) -> Grid {
    let rows: Vec<String> = (0..height)
        .map(|y| {
            (0..width)
                .map(|x| {
                    if x == y {
                        '#'
                    } else if y > height * 3 / 4 && x % 3 == 0 {
                        '.'
                    } else {
                        ' '
                    }
                })
                .collect()
        })
        .collect();
    Grid::from_rows(&rows).expect("grille de bench")
}

/// Every cell inked, cycling through a small palette.
fn dense_frame(width: usize, height: usize) -> Grid {
    let palette: Vec<char> = " .:-=+*#%@".chars().collect();
    let rows: Vec<String> = (0..height)
        .map(|y| (0..width).map(|x| palette[(x * 7 + y * 3) % palette.len()]).collect())
        .collect();
    Grid::from_rows(&rows).expect("grille de bench")
}

fn bench_encode(c: &mut Criterion) {
    let config = CodecConfig {
        bitmap_palette: PALETTE_AUTO.to_string(),
        ..CodecConfig::default()
    };
    let mut group = c.benchmark_group("encode");
    for (name, grid) in [("sparse", sparse_frame(160, 48)), ("dense", dense_frame(160, 48))] {
        for tag in CodecTag::ALL.into_iter().filter(|t| *t != CodecTag::Hybrid) {
            group.bench_with_input(BenchmarkId::new(tag.name(), name), &grid, |b, grid| {
                b.iter(|| encode_payload(tag, black_box(grid), None, &config));
            });
        }
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let config = CodecConfig {
        bitmap_palette: PALETTE_AUTO.to_string(),
        ..CodecConfig::default()
    };
    let registry = DecoderRegistry::standard();
    let mut group = c.benchmark_group("decode");
    for (name, grid) in [("sparse", sparse_frame(160, 48)), ("dense", dense_frame(160, 48))] {
        for tag in CodecTag::ALL.into_iter().filter(|t| *t != CodecTag::Hybrid) {
            let Ok(payload) = encode_payload(tag, &grid, None, &config) else {
                continue;
            };
            let value = serde_json::to_value(&payload).unwrap_or_default();
            group.bench_with_input(BenchmarkId::new(tag.name(), name), &value, |b, value| {
                b.iter(|| registry.decode_value(black_box(value)));
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode);
criterion_main!(benches);
