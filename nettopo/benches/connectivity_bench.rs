use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nettopo::prelude::*;
use nettopo::{connectivity, engine, netlist};

/// Ladder network: n stages of series resistor + shunt capacitor.
fn ladder_netlist(stages: usize) -> String {
    let mut text = String::from("ladder\nV1 n0 0 5\n");
    for i in 0..stages {
        text.push_str(&format!("R{} n{} n{} 1k\n", i + 1, i, i + 1));
        text.push_str(&format!("C{} n{} 0 100n\n", i + 1, i + 1));
    }
    text.push_str(".end\n");
    text
}

fn ladder_schematic(stages: usize) -> Schematic {
    engine::schematic_from_netlist(&ladder_netlist(stages)).expect("ladder lays out")
}

fn bench_analyze(c: &mut Criterion) {
    let schematic = ladder_schematic(50);
    c.bench_function("analyze_ladder_50", |b| {
        b.iter(|| connectivity::analyze(black_box(&schematic)));
    });
}

fn bench_generate_netlist(c: &mut Criterion) {
    let schematic = ladder_schematic(50);
    c.bench_function("generate_netlist_ladder_50", |b| {
        b.iter(|| engine::generate_netlist(black_box(&schematic)));
    });
}

fn bench_parse_netlist(c: &mut Criterion) {
    let text = ladder_netlist(50);
    c.bench_function("parse_netlist_ladder_50", |b| {
        b.iter(|| netlist::parse(black_box(&text)));
    });
}

fn bench_layout(c: &mut Criterion) {
    let parsed = netlist::parse(&ladder_netlist(50));
    c.bench_function("layout_ladder_50", |b| {
        b.iter(|| nettopo::layout::layout(black_box(&parsed)));
    });
}

criterion_group!(
    benches,
    bench_analyze,
    bench_generate_netlist,
    bench_parse_netlist,
    bench_layout
);
criterion_main!(benches);
