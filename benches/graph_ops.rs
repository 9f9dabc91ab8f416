//! Benchmarks for concept graph operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{Rng, SeedableRng};

use cerebro::graph::concept::{ConceptGraph, ConceptStore};
use cerebro::graph::path::find_path;
use cerebro::graph::weight::WeightModel;
use cerebro::language::{LanguageService, LexicalLanguageService};

/// A random graph of `nodes` concepts with about four edges per node.
fn random_graph(nodes: usize) -> ConceptGraph {
    let mut rng = rand::rngs::StdRng::seed_from_u64(0);
    let mut graph = ConceptGraph::in_memory();
    for i in 0..nodes * 4 {
        let a = format!("concepto{}", i % nodes);
        let b = format!("concepto{}", rng.gen_range(0..nodes));
        graph.add_or_reinforce_edge(&a, &b, rng.gen_range(0.1..2.0));
    }
    graph
}

fn bench_related(c: &mut Criterion) {
    let graph = random_graph(1_000);
    c.bench_function("related_1k", |bench| {
        bench.iter(|| black_box(graph.related("concepto7", 0.5)))
    });
}

fn bench_dynamic_weight(c: &mut Criterion) {
    let graph = random_graph(1_000);
    let language = LexicalLanguageService::new();
    c.bench_function("dynamic_weight_1k", |bench| {
        bench.iter(|| {
            black_box(WeightModel::dynamic_weight(
                graph.graph(),
                "concepto1",
                "concepto2",
                |a, b| language.similarity(a, b),
            ))
        })
    });
}

fn bench_shortest_path(c: &mut Criterion) {
    let graph = random_graph(1_000);
    c.bench_function("shortest_path_1k", |bench| {
        bench.iter(|| black_box(find_path(graph.graph(), "concepto1", "concepto999", 3)))
    });
}

fn bench_nearest_concept(c: &mut Criterion) {
    let graph = random_graph(1_000);
    let language = LexicalLanguageService::new();
    c.bench_function("nearest_concept_scan_1k", |bench| {
        bench.iter(|| {
            black_box(graph.nearest_concept("conceptos", |a, b| language.similarity(a, b)))
        })
    });
}

criterion_group!(
    benches,
    bench_related,
    bench_dynamic_weight,
    bench_shortest_path,
    bench_nearest_concept
);
criterion_main!(benches);
