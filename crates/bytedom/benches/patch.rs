//! Patch engine benchmarks.
//!
//! Measures patching a list against itself, against an edited copy with the
//! same shape, and against a copy whose labels all changed length.

use bytedom::patch;
use bytedom::view::{Container, Node, Render, Tag, Text};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn list(n: usize, label: impl Fn(usize) -> String) -> Vec<u8> {
    let items: Vec<Node> = (0..n)
        .map(|i| {
            Container::new(vec![Text::new(label(i)).into()])
                .tag(Tag::Li)
                .into()
        })
        .collect();
    Container::new(items).tag(Tag::Ul).render().unwrap()
}

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");

    for size in [10, 100, 300].iter() {
        let old = list(*size, |i| format!("item {i:04}"));
        let same_shape = list(*size, |i| format!("edit {i:04}"));
        let longer = list(*size, |i| format!("a longer label {i}"));

        group.bench_with_input(BenchmarkId::new("identical", size), &old, |b, old| {
            b.iter(|| black_box(patch(old, old)));
        });
        group.bench_with_input(BenchmarkId::new("same_shape", size), &same_shape, |b, new| {
            b.iter(|| black_box(patch(&old, new)));
        });
        group.bench_with_input(BenchmarkId::new("longer", size), &longer, |b, new| {
            b.iter(|| black_box(patch(&old, new)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_patch);
criterion_main!(benches);
