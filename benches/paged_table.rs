//! Paged table benchmarks for geodict
//!
//! Random reads through the mapped page cache (warm and with a cache too
//! small for the working set) and bulk appends.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geodict::{AddressNode, PagedTable, TableOptions};
use tempfile::tempdir;

const RECORDS: u32 = 100_000;
const PAGE: usize = 10_000;

fn node(id: u32) -> AddressNode {
    AddressNode {
        id,
        name: format!("字{}", id),
        name_index: format!("字{}", id),
        x: 139.0,
        y: 35.0,
        level: 6,
        priority: 3,
        note: String::new(),
        parent_id: id / 8,
        sibling_id: id + 1,
    }
}

fn bench_get_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let records: Vec<AddressNode> = (0..RECORDS).map(node).collect();
    let mut group = c.benchmark_group("get_record");

    for capacity in [2usize, 10] {
        let name = format!("cache_{}", capacity);
        let mut table = PagedTable::create(
            dir.path(),
            &name,
            TableOptions::default().page_size(PAGE).cache_capacity(capacity),
        )
        .unwrap();
        table.append_records(&records).unwrap();

        group.bench_with_input(BenchmarkId::new("strided", capacity), &table, |b, table| {
            let mut pos = 0u64;
            b.iter(|| {
                pos = (pos + 7_919) % RECORDS as u64;
                black_box(table.get_record(pos).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_append(c: &mut Criterion) {
    let records: Vec<AddressNode> = (0..RECORDS).map(node).collect();
    let mut group = c.benchmark_group("append_records");
    group.throughput(Throughput::Elements(RECORDS as u64));
    group.sample_size(10);

    group.bench_function("100k", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let mut table = PagedTable::create(
                dir.path(),
                "address_node",
                TableOptions::default().page_size(PAGE),
            )
            .unwrap();
            table.append_records(black_box(&records)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(benches, bench_get_record, bench_append);
criterion_main!(benches);
