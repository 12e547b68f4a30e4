//! Tree build benchmarks for geodict
//!
//! Sort, tree construction and index building over a synthetic region of
//! block-level addresses.

use std::fmt::Write;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use geodict::{BuildOptions, DictionaryBuilder};
use tempfile::tempdir;

fn synthetic_region(cities: usize, oaza: usize, blocks: usize) -> String {
    let mut text = String::new();
    for c in 0..cities {
        for o in 0..oaza {
            for b in 0..blocks {
                writeln!(
                    text,
                    "東京都;1,市{c};3,町{o};5,{b}丁目;6,!03,{:.4},{:.4},aza_id:{c:03}{o:03}{b:02}",
                    139.0 + b as f64 * 1e-3,
                    35.0 + o as f64 * 1e-3,
                )
                .unwrap();
            }
        }
    }
    text
}

fn bench_build(c: &mut Criterion) {
    let text = synthetic_region(20, 50, 10);
    let lines = text.lines().count() as u64;

    let mut group = c.benchmark_group("dictionary_build");
    group.throughput(Throughput::Elements(lines));
    group.sample_size(10);

    group.bench_function("tree_only", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let mut builder = DictionaryBuilder::create(
                dir.path(),
                BuildOptions::new().page_size(4_096).index_notes(false),
            )
            .unwrap();
            builder.add_region_text("13", "13_bench.txt", &text).unwrap()
        });
    });

    group.bench_function("with_indexes", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let options = BuildOptions::new().page_size(4_096);
            let mut builder = DictionaryBuilder::create(dir.path(), options).unwrap();
            builder.add_region_text("13", "13_bench.txt", &text).unwrap();
            builder.finish(&[]).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, bench_build);
criterion_main!(benches);
