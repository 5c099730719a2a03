//! Schema commit benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use folio_bench::fixtures::{author_layout, document_layout, stats_layout};
use folio_bench::harness::{commit_schema, init_tracing, TestContext};
use folio_core::{DataType, TypeLayout};

fn flat_layout(properties: usize) -> TypeLayout {
    let mut layout = TypeLayout::new();
    for i in 0..properties {
        layout
            .create_primitive(&format!("p{i}"), DataType::Int64)
            .unwrap();
    }
    layout
}

fn bench_commit_new(c: &mut Criterion) {
    init_tracing();
    let mut group = c.benchmark_group("commit/new");

    for properties in [1, 10, 50] {
        group.bench_with_input(
            BenchmarkId::new("flat", properties),
            &properties,
            |b, &properties| {
                let mut ctx = TestContext::new();
                let layout = flat_layout(properties);
                let mut idx = 0;

                b.iter(|| {
                    let name = format!("t{idx}");
                    idx += 1;
                    let ns = ctx.namespace;
                    black_box(layout.commit(&mut ctx.library, ns, &name, true).unwrap());
                });
            },
        );
    }

    group.bench_function("document_schema", |b| {
        b.iter_batched(
            TestContext::new,
            |mut ctx| black_box(commit_schema(&mut ctx)),
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_commit_existing(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit/existing");

    group.bench_function("flat", |b| {
        let mut ctx = TestContext::new();
        let ns = ctx.namespace;
        author_layout()
            .commit(&mut ctx.library, ns, "author", true)
            .unwrap();
        let layout = author_layout();

        b.iter(|| black_box(layout.commit(&mut ctx.library, ns, "author", true).unwrap()));
    });

    group.bench_function("with_references", |b| {
        let mut schema = TestContext::with_schema();
        let ns = schema.ctx.namespace;
        let layout = {
            let library = &schema.ctx.library;
            let stats = library.find_type("bench", "stats").unwrap();
            document_layout(library.get_type(schema.authors).unwrap(), stats)
        };

        b.iter(|| {
            black_box(
                layout
                    .commit(&mut schema.ctx.library, ns, "document", true)
                    .unwrap(),
            )
        });
    });

    group.finish();
}

fn bench_commit_nested(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit/nested");

    for depth in [1, 4, 8] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            b.iter_batched(
                || {
                    let mut ctx = TestContext::new();
                    let ns = ctx.namespace;
                    let (_, mut inner) = stats_layout()
                        .commit(&mut ctx.library, ns, "level0", false)
                        .unwrap();
                    for level in 1..depth {
                        let mut layout = TypeLayout::new();
                        layout
                            .create_nested("inner", ctx.library.get_type(inner).unwrap())
                            .unwrap();
                        let name = format!("level{level}");
                        inner = layout.commit(&mut ctx.library, ns, &name, false).unwrap().1;
                    }
                    (ctx, inner)
                },
                |(mut ctx, inner)| {
                    let ns = ctx.namespace;
                    let mut layout = TypeLayout::new();
                    layout
                        .create_nested("root", ctx.library.get_type(inner).unwrap())
                        .unwrap();
                    black_box(layout.commit(&mut ctx.library, ns, "top", true).unwrap());
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_commit_new,
    bench_commit_existing,
    bench_commit_nested
);
criterion_main!(benches);
