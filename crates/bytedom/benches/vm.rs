//! Encoder and VM throughput benchmarks.
//!
//! Measures:
//! - Rendering wide and deep trees to bytecode
//! - Executing the rendered programs against the in-memory document
//! - Streaming the same program in fixed-size chunks

use bytedom::view::{Container, Node, Render, Tag, Text};
use bytedom::{Document, Session, Vm};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

/// A list with `n` items, each an `<li>` with an attribute and a label.
fn wide_tree(n: usize) -> Container {
    let items: Vec<Node> = (0..n)
        .map(|i| {
            Container::new(vec![Text::new(format!("item {i}")).into()])
                .tag(Tag::Li)
                .attr("data-index", &i.to_string())
                .into()
        })
        .collect();
    Container::new(items).tag(Tag::Ul)
}

/// `depth` nested sections around a single text leaf.
fn deep_tree(depth: usize) -> Container {
    let mut tree = Container::new(vec![Text::new("leaf").into()]);
    for _ in 1..depth {
        tree = Container::new(vec![tree.into()]).tag(Tag::Section);
    }
    tree
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [10, 100, 300].iter() {
        let tree = wide_tree(*size);
        group.bench_with_input(BenchmarkId::new("wide", size), &tree, |b, tree| {
            b.iter(|| black_box(tree.render().unwrap()));
        });
    }

    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    for size in [10, 100, 300].iter() {
        let program = wide_tree(*size).render().unwrap();
        group.bench_with_input(BenchmarkId::new("wide", size), &program, |b, program| {
            b.iter(|| {
                let mut session = Session::new(Document::new());
                black_box(session.run(program.clone()).unwrap());
            });
        });
    }

    for depth in [10, 100, 500].iter() {
        let program = deep_tree(*depth).render().unwrap();
        group.bench_with_input(BenchmarkId::new("deep", depth), &program, |b, program| {
            b.iter(|| {
                let mut session = Session::new(Document::new());
                black_box(session.run(program.clone()).unwrap());
            });
        });
    }

    group.finish();
}

fn bench_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("streaming");
    let program = wide_tree(100).render().unwrap();

    for chunk in [1, 16, 256].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(chunk), chunk, |b, &chunk| {
            b.iter(|| {
                let mut doc = Document::new();
                let mut vm = Vm::new(Vec::with_capacity(program.len()), &doc);
                for part in program.chunks(chunk) {
                    vm.feed(part);
                    black_box(vm.run(&mut doc).unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_execute, bench_streaming);
criterion_main!(benches);
