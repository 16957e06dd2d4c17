//! Benchmarks for SGR compaction throughput.
//!
//! The compactor runs over every assembled frame before the single write,
//! so its cost is paid per flush. The interesting inputs are frames heavy
//! with attribute churn (worst case) and frames that are mostly text
//! (common case, where the ESC scan should dominate).
//!
//! Run with: cargo bench -p mosaic-render --bench compact_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mosaic_render::compact;
use std::hint::black_box;

/// A frame alternating short SGRs with single glyphs: maximal merge work.
fn churn_frame(cells: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..cells {
        buf.extend_from_slice(b"\x1b[0m");
        buf.extend_from_slice(format!("\x1b[3{}m", i % 8).as_bytes());
        buf.push(b'a' + (i % 26) as u8);
    }
    buf
}

/// A frame that is mostly text with an occasional style change.
fn text_frame(cells: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    for i in 0..cells {
        if i % 40 == 0 {
            buf.extend_from_slice(b"\x1b[0m\x1b[1m");
        }
        buf.push(b'a' + (i % 26) as u8);
    }
    buf
}

fn bench_compact(c: &mut Criterion) {
    let mut group = c.benchmark_group("sgr_compact");

    for cells in [80 * 24, 200 * 60] {
        let churn = churn_frame(cells);
        group.throughput(Throughput::Bytes(churn.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("churn", cells),
            &churn,
            |b, input| b.iter(|| black_box(compact(input))),
        );

        let text = text_frame(cells);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("text", cells),
            &text,
            |b, input| b.iter(|| black_box(compact(input))),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_compact);
criterion_main!(benches);
