//! Criterion benchmarks for the beam graph.
//! Layout: one source feeding a full binary tree of beam splitters.
//! Focus depths: d in {4, 6, 8}.

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use beamfold::component::{Component, ComponentId, ComponentKind, Components, Port};
use beamfold::geom::Point2;
use beamfold::graph::{BeamGraph, BranchCounter};
use beamfold::segment::{BeamSegment, SegmentIdGen};

fn splitter_tree(depth: u32, seed: u64) -> (Components, BeamGraph) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut components = Components::new();
    let mut graph = BeamGraph::new();
    let mut ids = SegmentIdGen::default();
    let mut place = |id: &str, kind: ComponentKind, components: &mut Components| {
        let p = Point2::new(rng.gen_range(0.0..1200.0), rng.gen_range(0.0..800.0));
        components.insert(ComponentId::from(id), Component::new(id, kind, p, 0.0));
    };
    place("src", ComponentKind::Source { power: 1.0 }, &mut components);
    let splitter = ComponentKind::BeamSplitter {
        split_ratio: 0.5,
        shallow_angle: None,
    };
    // Heap numbering: node k has children 2k and 2k + 1.
    let nodes = (1u32 << depth) - 1;
    for k in 1..=nodes {
        place(&format!("n{k}"), splitter.clone(), &mut components);
    }
    graph.add_segment(BeamSegment::between(ids.next_id(), "src".into(), Port::Output, "n1".into()));
    for k in 1..=nodes / 2 {
        let from = ComponentId(format!("n{k}"));
        for (child, port) in [(2 * k, Port::Reflected), (2 * k + 1, Port::Transmitted)] {
            let to = ComponentId(format!("n{child}"));
            graph.add_segment(BeamSegment::between(ids.next_id(), from.clone(), port, to));
        }
    }
    (components, graph)
}

fn bench_graph(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph");
    let src = ComponentId::from("src");
    for &d in &[4u32, 6, 8] {
        let (components, graph) = splitter_tree(d, 7);
        group.bench_with_input(BenchmarkId::new("trace_from_source", d), &d, |b, _| {
            b.iter(|| graph.trace_from_source(&src, 50).len())
        });
        group.bench_with_input(BenchmarkId::new("assign_branch_colors", d), &d, |b, _| {
            b.iter_batched(
                || graph.clone(),
                |mut g| g.assign_branch_colors(&components, &mut BranchCounter::default()),
                BatchSize::SmallInput,
            )
        });
        group.bench_with_input(BenchmarkId::new("recalculate_path_lengths", d), &d, |b, _| {
            b.iter_batched(
                || graph.clone(),
                |mut g| g.recalculate_path_lengths(&components),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_graph);
criterion_main!(benches);
