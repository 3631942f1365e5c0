use anchor_core::graph::AnchoredGraph;
use anchor_core::record::RecordGroups;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

fn make_input(record_count: usize) -> RecordGroups {
    let members: Vec<Value> = (0..record_count)
        .map(|i| {
            json!({
                "id": i,
                "tags": [i % 7, i % 11, i % 13],
                "roles": [format!("role_{}", i % 5)],
            })
        })
        .collect();
    match json!({ "members": members }) {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

fn bench_build_100(c: &mut Criterion) {
    let input = make_input(100);

    c.bench_function("build_graph_100_records", |b| {
        b.iter(|| {
            let mut graph = AnchoredGraph::new();
            graph
                .build_graph(black_box(&input), "id", &["tags", "roles"])
                .unwrap()
                .map(Iterator::count)
        })
    });
}

fn bench_build_1000(c: &mut Criterion) {
    let input = make_input(1000);

    c.bench_function("build_graph_1000_records", |b| {
        b.iter(|| {
            let mut graph = AnchoredGraph::new();
            graph
                .build_graph(black_box(&input), "id", &["tags", "roles"])
                .unwrap()
                .map(Iterator::count)
        })
    });
}

fn bench_find_subtype(c: &mut Criterion) {
    let input = make_input(1000);
    let mut graph = AnchoredGraph::new();
    graph.build_graph(&input, "id", &["tags", "roles"]).unwrap();

    c.bench_function("find_nodes_subtype_1000_records", |b| {
        b.iter(|| {
            graph
                .find_nodes_subtype(black_box("tags"))
                .map(|nodes| nodes.count())
        })
    });
}

criterion_group!(
    benches,
    bench_build_100,
    bench_build_1000,
    bench_find_subtype
);
criterion_main!(benches);
