//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use weave_core::{ConcretePackage, LooseRequirement, Manifest, Version, VersionRange};
use weave_registry::InMemoryProvider;
use weave_resolver::Rule;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(3))
        .measurement_time(std::time::Duration::from_secs(10))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

/// Name of the package at `index` within `layer`
pub fn layer_package(layer: usize, index: usize) -> String {
    format!("pkg-{}-{}", layer, index)
}

/// A layered graph `depth` layers deep and `width` packages wide.
///
/// Every package exists at 1.0 and 2.0. Each one depends on two packages of
/// the next layer with the range [1.0, 2.0], so every actor re-resolves at
/// least once as rules accumulate. Returns the provider and the first layer
/// as roots.
pub fn layered_graph(width: usize, depth: usize) -> (InMemoryProvider, Vec<ConcretePackage>) {
    let provider = InMemoryProvider::new();
    let one = Version::from_parts(&[1, 0]);
    let two = Version::from_parts(&[2, 0]);

    for layer in 0..depth {
        for index in 0..width {
            for version in [&one, &two] {
                let target = ConcretePackage::new(layer_package(layer, index), version.clone());
                let mut manifest = Manifest::empty(target);
                if layer + 1 < depth {
                    for child in [index, (index + 1) % width] {
                        manifest = manifest.with_requirement(LooseRequirement::new(
                            layer_package(layer + 1, child),
                            one.clone(),
                            two.clone(),
                        ));
                    }
                }
                provider.insert(manifest);
            }
        }
    }

    let roots = (0..width)
        .map(|index| ConcretePackage::new(layer_package(0, index), one.clone()))
        .collect();
    (provider, roots)
}

/// `count` overlapping rules whose intersection is non-empty
pub fn overlapping_rules(count: usize) -> Vec<Rule> {
    (0..count)
        .map(|i| {
            let low = (i % 10) as u64;
            let high = 100 + (i % 17) as u64;
            Rule::new(
                format!("owner-{}", i),
                VersionRange::new(
                    Version::from_parts(&[low, (i % 3) as u64]),
                    Version::from_parts(&[high]),
                ),
            )
        })
        .collect()
}

/// Version strings of varying shape
pub fn version_strings(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 4 {
            0 => format!("{}.{}", i % 20, i % 7),
            1 => format!("{}.{}.{}", i % 5, i % 11, i % 13),
            2 => format!("{}-{}", i % 9, i % 3),
            _ => "latest".to_string(),
        })
        .collect()
}
