//! Registry benchmarks.
//!
//! Measures the hot registry operations: upsert, slug lookup, the linear
//! field scan behind `find_by_field`, and per-document invalidation.
//!
//! # Running
//!
//! ```bash
//! cargo bench --bench registry
//! # With a custom filter:
//! cargo bench --bench registry -- find_by_field
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::json;

use weft::model::entity::Story;
use weft::{DocumentId, Registry, Slug};

/// Build a registry of `n` stories spread over `n / 10` documents.
fn populated(n: usize) -> Registry<Story> {
    let mut reg = Registry::new();
    for i in 0..n {
        reg.save(Story {
            slug: Slug::new(&format!("story-{i}")).unwrap(),
            owning_document: DocumentId::new(&format!("doc-{}.md", i / 10)).unwrap(),
            title: format!("Story {i}"),
            persona: None,
            epic: None,
            acceptance: vec![],
        });
    }
    reg
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save");
    for n in [100, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| populated(n));
        });
    }
    group.finish();
}

fn bench_get(c: &mut Criterion) {
    let reg = populated(10_000);
    let hit = Slug::new("story-5000").unwrap();
    let miss = Slug::new("story-99999").unwrap();
    c.bench_function("get/hit", |b| b.iter(|| reg.get(&hit)));
    c.bench_function("get/miss", |b| b.iter(|| reg.get(&miss)));
}

fn bench_find_by_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_by_field");
    for n in [100, 1_000, 10_000] {
        let reg = populated(n);
        let wanted = json!(format!("Story {}", n / 2));
        group.bench_with_input(BenchmarkId::from_parameter(n), &reg, |b, reg| {
            b.iter(|| reg.find_by_field("title", &wanted));
        });
    }
    group.finish();
}

fn bench_clear_by_owning_document(c: &mut Criterion) {
    c.bench_function("clear_by_owning_document/10k", |b| {
        b.iter_batched(
            || populated(10_000),
            |mut reg| reg.clear_by_owning_document(&DocumentId::new("doc-500.md").unwrap()),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_save,
    bench_get,
    bench_find_by_field,
    bench_clear_by_owning_document
);
criterion_main!(benches);
