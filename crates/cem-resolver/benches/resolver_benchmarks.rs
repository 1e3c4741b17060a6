//! Benchmarks for alias expansion and template-literal types.
//!
//! Performance targets:
//! - Simple alias chain: < 10μs
//! - Template cross-product (4 x 4): < 50μs

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use cem_resolver::{expand_alias, union_literals, AliasMap};

fn alias_map() -> AliasMap {
    let mut map = AliasMap::new();
    map.insert("Side".into(), "'top' | 'right' | 'bottom' | 'left'".into());
    map.insert("Align".into(), "'start' | 'center' | 'end' | 'baseline'".into());
    map.insert("Placement".into(), "`${Side}-${Align}`".into());
    map.insert("Tone".into(), "'info' | 'warning'".into());
    map.insert("Chained".into(), "Tone".into());
    map
}

fn bench_alias_chain(c: &mut Criterion) {
    let map = alias_map();
    c.bench_function("expand_alias_chain", |b| {
        b.iter(|| black_box(expand_alias(black_box("Chained"), &map)));
    });
}

fn bench_template_cross_product(c: &mut Criterion) {
    let map = alias_map();
    c.bench_function("expand_template_cross_product", |b| {
        b.iter(|| black_box(expand_alias(black_box("Placement"), &map)));
    });
}

fn bench_union_literals(c: &mut Criterion) {
    let map = alias_map();
    let expanded = expand_alias("Placement", &map);
    c.bench_function("union_literals_16_members", |b| {
        b.iter(|| black_box(union_literals(black_box(&expanded))));
    });
}

criterion_group!(
    benches,
    bench_alias_chain,
    bench_template_cross_product,
    bench_union_literals
);
criterion_main!(benches);
