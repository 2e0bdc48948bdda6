//! Benchmarks for loading text into viewers.
//!
//! Run with: cargo bench

use codeview_buffer::TextBuffer;
use codeview_core::{CodeViewer, Element, Page, derive_mode};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// Generates a Rust source file with the given number of lines.
fn generate_source(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("fn item_{i}() -> u32 {{ let x = {i}; x * 2 }} // line {i}\n"))
        .collect()
}

/// Benchmarks replacing buffer content, as happens when a fetch lands.
fn bench_set_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_text");

    for size in [100, 1000, 10000, 100000].iter() {
        let text = generate_source(*size);

        group.bench_with_input(BenchmarkId::new("replace", size), &text, |b, text| {
            let mut buffer = TextBuffer::from("Loading...");
            b.iter(|| {
                buffer.set_text(black_box(text.as_str()));
                black_box(buffer.len_lines())
            })
        });
    }

    group.finish();
}

/// Benchmarks line access used by rendering and line jumps.
fn bench_line_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_access");

    let text = generate_source(100000);
    let buffer = TextBuffer::from(text.as_str());

    group.bench_function("line_to_byte", |b| {
        b.iter(|| black_box(buffer.line_to_byte(black_box(50000)).unwrap()))
    });

    group.bench_function("clamp_line", |b| {
        b.iter(|| black_box(buffer.clamp_line(black_box(250000))))
    });

    group.finish();
}

/// Benchmarks a full viewer load: content, highlighting, resize.
fn bench_viewer_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("viewer_load");

    for size in [100, 1000, 5000].iter() {
        let text = generate_source(*size);
        let mut page = Page::new(".");
        let element = page.push(Element::new("div"));

        group.bench_with_input(BenchmarkId::new("rust", size), &text, |b, text| {
            let mut viewer = CodeViewer::bind(&element);
            viewer.set_mode(derive_mode("src/lib.rs", None));
            b.iter(|| {
                viewer.set_value(black_box(text));
                viewer.resize();
                black_box(viewer.spans().len())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_set_text, bench_line_access, bench_viewer_load);

criterion_main!(benches);
