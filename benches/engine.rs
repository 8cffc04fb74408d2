//! Engine-level benchmarks.
//!
//! These measure the cut-set pipeline on realistic workload shapes: wide
//! two-level fault trees, k-out-of-n voting products, and random trees
//! that stress the compute tables.
//!
//! Run with:
//! ```bash
//! cargo bench --bench engine
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use zbdd_rs::graph::{BooleanGraph, Gate, GateType, Literal};
use zbdd_rs::settings::Settings;
use zbdd_rs::zbdd::Zbdd;

/// OR of all C(n, 2) two-literal products over n variables.
fn pairwise_products(num_vars: i32) -> BooleanGraph {
    let mut graph = BooleanGraph::new(10_000);
    let mut root = Gate::new(10_000, GateType::Or, 1);
    let mut index = 10_001;
    for left in 1..=num_vars {
        for right in (left + 1)..=num_vars {
            let mut and = Gate::new(index, GateType::And, 1);
            and.add_variable(Literal::new(left, left as u32));
            and.add_variable(Literal::new(right, right as u32));
            graph.add_gate(and);
            root.add_gate(index);
            index += 1;
        }
    }
    graph.add_gate(root);
    graph
}

/// Random two-level coherent tree over `num_vars` variables.
fn random_tree(num_vars: i32, num_groups: i32, seed: u64) -> BooleanGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut graph = BooleanGraph::new(10_000);
    let mut root = Gate::new(10_000, GateType::Or, 1);
    for group in 0..num_groups {
        let index = 10_001 + group;
        let mut and = Gate::new(index, GateType::And, 1);
        for _ in 0..rng.random_range(1..5) {
            let variable = rng.random_range(1..=num_vars);
            and.add_variable(Literal::new(variable, variable as u32));
        }
        graph.add_gate(and);
        root.add_gate(index);
    }
    graph.add_gate(root);
    graph
}

fn bench_pairwise_products(c: &mut Criterion) {
    let mut group = c.benchmark_group("zbdd/pairwise_products");

    for num_vars in [8, 12, 16] {
        let graph = pairwise_products(num_vars);
        group.bench_with_input(BenchmarkId::new("analyze", num_vars), &graph, |b, graph| {
            b.iter(|| {
                let settings = Settings::new().with_limit_order(2);
                let mut zbdd = Zbdd::from_graph(graph, &settings);
                zbdd.analyze();
                zbdd.cut_sets().len()
            });
        });
    }

    group.finish();
}

fn bench_limit_order_cutoff(c: &mut Criterion) {
    let mut group = c.benchmark_group("zbdd/limit_order");

    let graph = random_tree(20, 24, 42);
    for limit_order in [2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("random_tree", limit_order),
            &limit_order,
            |b, &limit_order| {
                b.iter(|| {
                    let settings = Settings::new().with_limit_order(limit_order);
                    let mut zbdd = Zbdd::from_graph(&graph, &settings);
                    zbdd.analyze();
                    zbdd.cut_sets().len()
                });
            },
        );
    }

    group.finish();
}

fn bench_shared_subtrees(c: &mut Criterion) {
    let mut group = c.benchmark_group("zbdd/shared_subtrees");

    // Parents all reuse one shared OR gate; the per-gate memo must keep
    // the conversion linear in the number of parents.
    for num_parents in [8, 16, 32] {
        let mut graph = BooleanGraph::new(10_000);
        let mut root = Gate::new(10_000, GateType::Or, 1);
        for parent in 0..num_parents {
            let index = 10_001 + parent;
            let mut and = Gate::new(index, GateType::And, 1);
            let variable = parent + 1;
            and.add_variable(Literal::new(variable, variable as u32));
            and.add_gate(20_000);
            graph.add_gate(and);
            root.add_gate(index);
        }
        graph.add_gate(root);

        let mut shared = Gate::new(20_000, GateType::Or, 1);
        shared.add_variable(Literal::new(100, 100));
        shared.add_variable(Literal::new(101, 101));
        graph.add_gate(shared);

        group.bench_with_input(BenchmarkId::new("parents", num_parents), &graph, |b, graph| {
            b.iter(|| {
                let settings = Settings::new().with_limit_order(3);
                let mut zbdd = Zbdd::from_graph(graph, &settings);
                zbdd.analyze();
                zbdd.cut_sets().len()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pairwise_products, bench_limit_order_cutoff, bench_shared_subtrees);
criterion_main!(benches);
