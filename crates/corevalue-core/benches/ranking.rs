use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use corevalue_core::PreferenceGraph;
use corevalue_core::ranking::{TransitiveAnalysis, degree_ranking};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::index;

/// Value-set sizes worth timing: a short list, a typical list, a huge list.
const SIZES: [usize; 3] = [12, 60, 250];

/// Fill a graph the way a full session would: `n * n` three-way picks,
/// the first item of each triple beating the other two.
fn session_graph(len: usize, seed: u64) -> PreferenceGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut graph = PreferenceGraph::new(len);
    for _ in 0..len * len {
        let triple = index::sample(&mut rng, len, len.min(3)).into_vec();
        let (&winner, losers) = triple.split_first().expect("len >= 1");
        for &loser in losers {
            graph.add_edge(winner, loser).expect("distinct in-range pair");
        }
    }
    graph
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");

    for len in SIZES {
        let graph = session_graph(len, 0x51EED_u64 + len as u64);

        group.bench_with_input(BenchmarkId::new("degree", len), &graph, |b, graph| {
            b.iter(|| black_box(degree_ranking(graph)));
        });

        group.bench_with_input(BenchmarkId::new("transitive", len), &graph, |b, graph| {
            b.iter(|| black_box(TransitiveAnalysis::compute(graph, 0.5)));
        });

        let cycles = TransitiveAnalysis::compute(&graph, 0.5).cycles.len();
        eprintln!(
            "SLO size={len} comparisons={} cycles={cycles}",
            graph.total_comparisons()
        );
    }

    group.finish();
}

criterion_group!(benches, bench_ranking);
criterion_main!(benches);
