//! Benchmarks for Buffer mutation and dirty iteration.
//!
//! Run with: cargo bench -p weft-render --bench buffer_bench

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use weft_core::geometry::Rect;
use weft_render::buffer::Buffer;
use weft_render::cell::{PackedRgba, Style};
use weft_render::diff::BufferDiff;

const SIZES: [(u16, u16); 3] = [(80, 24), (120, 40), (200, 60)];

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/fill");
    let styles = [
        Style::new().bg(PackedRgba::BLUE),
        Style::new().bg(PackedRgba::BLACK),
    ];

    for (w, h) in SIZES {
        group.throughput(Throughput::Elements(w as u64 * h as u64));
        let mut buf = Buffer::new(w, h);
        let mut flip = 0usize;
        group.bench_with_input(BenchmarkId::new("full", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                flip ^= 1;
                buf.fill(Rect::from_size(w, h), '#', styles[flip]);
                buf.clear_dirty();
                black_box(&buf);
            })
        });
    }
    group.finish();
}

fn bench_set_string(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/set_string");
    let line = "The quick brown fox jumps over the lazy dog. ".repeat(5);

    for (w, h) in SIZES {
        let mut buf = Buffer::new(w, h);
        group.bench_with_input(BenchmarkId::new("rows", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| {
                for y in 0..h {
                    buf.set_string(0, y, &line, Style::DEFAULT);
                }
                black_box(&buf);
            })
        });
    }
    group.finish();
}

fn bench_dirty_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer/diff");

    for (w, h) in SIZES {
        let mut front = Buffer::new(w, h);
        front.clear_dirty();
        let mut back = front.clone();
        for y in (0..h).step_by(3) {
            back.set_string(0, y, "Count: 1", Style::DEFAULT);
        }
        group.bench_with_input(BenchmarkId::new("sparse", format!("{w}x{h}")), &(), |b, _| {
            b.iter(|| black_box(BufferDiff::compute(&front, &back)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fill, bench_set_string, bench_dirty_diff);
criterion_main!(benches);
