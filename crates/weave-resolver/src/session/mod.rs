//! Resolution entry point
//!
//! Seeds one exact rule per root package, waits until the actor graph is
//! quiescent and flattens it. The actor graph lives only for one call.

use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use weave_core::error::{WeaveError, WeaveResult};
use weave_core::{ConcretePackage, Version, VersionRange};
use weave_registry::ManifestProvider;

use crate::actor::{ActorHandle, RuleUpdate};
use crate::cascade::cascade;
use crate::flatten::flatten;
use crate::tracker::{Tracker, TrackerConfig, DEFAULT_MAILBOX_CAPACITY};

/// Owner name of the rules placed on root packages
pub const ROOT_OWNER: &str = "<root>";

/// Resolver tuning
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Bound on queued messages per actor
    pub mailbox_capacity: usize,
    /// Deadline for a single manifest lookup
    pub manifest_timeout: Option<Duration>,
    /// Deadline for the whole graph to settle
    pub settle_timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            manifest_timeout: None,
            settle_timeout: None,
        }
    }
}

impl ResolverConfig {
    fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            mailbox_capacity: self.mailbox_capacity,
            manifest_timeout: self.manifest_timeout,
        }
    }
}

/// Result of dependency resolution
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// Every package reachable from the roots, in depth-first order
    pub packages: Vec<ConcretePackage>,
    /// Root packages that were requested
    pub roots: Vec<ConcretePackage>,
    /// Total number of packages resolved
    pub package_count: usize,
    /// Resolution time in milliseconds
    pub resolution_time_ms: u64,
}

/// Actor-based dependency resolver
#[derive(Debug, Clone)]
pub struct Resolver {
    provider: Arc<dyn ManifestProvider>,
    config: ResolverConfig,
}

impl Resolver {
    /// Create new resolver over a manifest provider
    pub fn new(provider: Arc<dyn ManifestProvider>, config: ResolverConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the full dependency set of `roots`
    pub async fn resolve(&self, roots: &[ConcretePackage]) -> WeaveResult<ResolutionResult> {
        let start_time = Instant::now();
        let roots = merge_roots(roots)?;
        info!(
            "Resolving {} root package(s) using {}",
            roots.len(),
            self.provider.describe()
        );

        let tracker = Tracker::new(Arc::clone(&self.provider), self.config.tracker_config());
        let outcome = self.settle_and_flatten(&tracker, &roots).await;
        tracker.shutdown();
        let packages = outcome?;

        let resolution_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Resolved {} package(s) in {}ms",
            packages.len(),
            resolution_time_ms
        );

        Ok(ResolutionResult {
            package_count: packages.len(),
            packages,
            roots,
            resolution_time_ms,
        })
    }

    async fn settle_and_flatten(
        &self,
        tracker: &Tracker,
        roots: &[ConcretePackage],
    ) -> WeaveResult<Vec<ConcretePackage>> {
        let (seed, waiter) = cascade();
        for root in roots {
            let update = RuleUpdate::set(
                ROOT_OWNER,
                VersionRange::exact(root.version.clone()),
                seed.clone(),
            );
            tracker.upsert(&root.name, update).await;
        }
        drop(seed);

        match self.config.settle_timeout {
            Some(limit) => tokio::time::timeout(limit, waiter.settled())
                .await
                .map_err(|_| WeaveError::Timeout {
                    operation: "dependency graph to settle".to_string(),
                    elapsed_ms: limit.as_millis() as u64,
                })??,
            None => waiter.settled().await?,
        }
        debug!("Graph settled with {} actors", tracker.actor_count());

        let handles = roots
            .iter()
            .map(|root| {
                tracker
                    .lookup(&root.name)
                    .ok_or_else(|| WeaveError::UnresolvedPackage {
                        name: root.name.clone(),
                    })
            })
            .collect::<WeaveResult<Vec<ActorHandle>>>()?;

        flatten(tracker, &handles).await
    }
}

/// Resolve with default settings, returning only the package list
pub async fn resolve(
    provider: Arc<dyn ManifestProvider>,
    roots: &[ConcretePackage],
) -> WeaveResult<Vec<ConcretePackage>> {
    let result = Resolver::new(provider, ResolverConfig::default())
        .resolve(roots)
        .await?;
    Ok(result.packages)
}

/// Collapse repeated roots; one name requested at two versions cannot be met
fn merge_roots(roots: &[ConcretePackage]) -> WeaveResult<Vec<ConcretePackage>> {
    let mut merged: IndexMap<&str, &Version> = IndexMap::with_capacity(roots.len());

    for root in roots {
        match merged.get(root.name.as_str()) {
            Some(existing) if **existing != root.version => {
                let (low, high) = if **existing < root.version {
                    (*existing, &root.version)
                } else {
                    (&root.version, *existing)
                };
                return Err(WeaveError::UnsatisfiableConstraints {
                    package: root.name.clone(),
                    lower_owner: ROOT_OWNER.to_string(),
                    lower_bound: high.to_string(),
                    upper_owner: ROOT_OWNER.to_string(),
                    upper_bound: low.to_string(),
                });
            },
            Some(_) => debug!("Ignoring repeated root {}", root),
            None => {
                merged.insert(&root.name, &root.version);
            },
        }
    }

    Ok(merged
        .into_iter()
        .map(|(name, version)| ConcretePackage::new(name, version.clone()))
        .collect())
}
