//! Dependency resolution performance benchmarks
//!
//! Measures range consolidation and full actor-graph resolution over
//! in-memory manifests.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use weave_benchmarks::{criterion_config, layered_graph, overlapping_rules};
use weave_registry::ManifestCache;
use weave_resolver::{consolidate, Resolver, ResolverConfig};

/// Benchmark rule consolidation for growing rule sets
fn bench_consolidation(c: &mut Criterion) {
    let mut group = c.benchmark_group("consolidation");

    for rule_count in [2, 16, 128, 1024].iter() {
        group.throughput(Throughput::Elements(*rule_count as u64));

        group.bench_with_input(
            BenchmarkId::new("rules", rule_count),
            rule_count,
            |b, &rule_count| {
                let rules = overlapping_rules(rule_count);
                b.iter(|| black_box(consolidate(&rules)));
            },
        );
    }

    group.finish();
}

/// Benchmark end-to-end resolution of layered graphs
fn bench_graph_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_resolution");
    group.sample_size(10);

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");

    for (width, depth) in [(4, 4), (8, 8), (16, 12)].iter() {
        let (provider, roots) = layered_graph(*width, *depth);
        let provider = Arc::new(ManifestCache::new(Arc::new(provider)));
        let resolver = Resolver::new(provider, ResolverConfig::default());

        group.throughput(Throughput::Elements((width * depth) as u64));
        group.bench_with_input(
            BenchmarkId::new("packages", width * depth),
            &roots,
            |b, roots| {
                b.iter(|| black_box(runtime.block_on(resolver.resolve(roots))));
            },
        );
    }

    group.finish();
}

/// Benchmark how mailbox capacity affects a mid-sized graph
fn bench_mailbox_capacity(c: &mut Criterion) {
    let mut group = c.benchmark_group("mailbox_capacity");
    group.sample_size(10);

    let runtime = tokio::runtime::Runtime::new().expect("tokio runtime");
    let (provider, roots) = layered_graph(8, 8);
    let provider = Arc::new(provider);

    for capacity in [1, 8, 64].iter() {
        let config = ResolverConfig {
            mailbox_capacity: *capacity,
            ..ResolverConfig::default()
        };
        let resolver = Resolver::new(provider.clone(), config);

        group.bench_with_input(BenchmarkId::new("capacity", capacity), &roots, |b, roots| {
            b.iter(|| black_box(runtime.block_on(resolver.resolve(roots))));
        });
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = criterion_config();
    targets = bench_consolidation, bench_graph_resolution, bench_mailbox_capacity
}
criterion_main!(benches);
