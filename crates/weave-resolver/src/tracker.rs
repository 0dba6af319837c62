//! Registry of package actors and the manifest dispatcher.
//!
//! The tracker owns the name to actor directory and is the only place actors
//! are created. Manifest lookups from every actor are funneled through one
//! dispatcher task, so the provider sees a single request at a time.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, debug_span, warn, Instrument};
use weave_core::error::{WeaveError, WeaveResult};
use weave_core::{ConcretePackage, Manifest, Version};
use weave_registry::ManifestProvider;

use crate::actor::{ActorHandle, PackageActor, RuleUpdate};

/// Default capacity of actor mailboxes and the manifest request queue
pub const DEFAULT_MAILBOX_CAPACITY: usize = 64;

/// Tracker tuning
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Bound on queued messages per actor; full mailboxes block the sender
    pub mailbox_capacity: usize,
    /// Deadline for a single manifest lookup
    pub manifest_timeout: Option<Duration>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            manifest_timeout: None,
        }
    }
}

/// Request to the manifest dispatcher
#[derive(Debug)]
pub struct ManifestQuery {
    pub package: ConcretePackage,
    pub reply: oneshot::Sender<WeaveResult<Manifest>>,
}

/// Shared handle to the actor directory and manifest dispatcher
#[derive(Debug, Clone)]
pub struct Tracker {
    inner: Arc<TrackerInner>,
}

#[derive(Debug)]
struct TrackerInner {
    actors: DashMap<String, ActorHandle>,
    manifests: mpsc::Sender<ManifestQuery>,
    config: TrackerConfig,
    closed: AtomicBool,
}

impl Tracker {
    /// Create a tracker and start its manifest dispatcher.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(provider: Arc<dyn ManifestProvider>, config: TrackerConfig) -> Self {
        let (manifests, requests) = mpsc::channel(config.mailbox_capacity.max(1));
        tokio::spawn(run_manifest_dispatcher(provider, requests));

        Self {
            inner: Arc::new(TrackerInner {
                actors: DashMap::new(),
                manifests,
                config,
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Current actor for `name`, if one was ever created
    pub fn lookup(&self, name: &str) -> Option<ActorHandle> {
        self.inner.actors.get(name).map(|entry| entry.value().clone())
    }

    /// Deliver an update to the actor for `name`, creating the actor first
    /// if needed
    pub async fn upsert(&self, name: &str, update: RuleUpdate) {
        if self.inner.closed.load(Ordering::Acquire) {
            update.cascade.fail(WeaveError::ActorUnavailable {
                name: name.to_string(),
            });
            return;
        }

        // The directory guard is released before waiting on the mailbox
        let handle = self.get_or_spawn(name);
        handle.deliver(update).await;
    }

    fn get_or_spawn(&self, name: &str) -> ActorHandle {
        match self.inner.actors.entry(name.to_string()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(entry) => {
                debug!("Spawning actor for {}", name);
                let (handle, actor) =
                    PackageActor::new(name, self.clone(), self.inner.config.mailbox_capacity);
                tokio::spawn(actor.run());
                entry.insert(handle.clone());
                handle
            },
        }
    }

    /// Fetch a manifest through the dispatcher
    pub async fn manifest(&self, name: &str, version: &Version) -> WeaveResult<Manifest> {
        let request = self.request_manifest(name, version);

        let result = match self.inner.config.manifest_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| WeaveError::Timeout {
                    operation: format!("manifest for {}@{}", name, version),
                    elapsed_ms: limit.as_millis() as u64,
                })?,
            None => request.await,
        };

        result.map_err(|e| WeaveError::manifest_resolution(name, &version.to_string(), e))
    }

    async fn request_manifest(&self, name: &str, version: &Version) -> WeaveResult<Manifest> {
        let dispatcher_gone = || WeaveError::ActorUnavailable {
            name: "manifest dispatcher".to_string(),
        };

        let (reply, response) = oneshot::channel();
        let query = ManifestQuery {
            package: ConcretePackage::new(name, version.clone()),
            reply,
        };
        self.inner
            .manifests
            .send(query)
            .await
            .map_err(|_| dispatcher_gone())?;

        response.await.map_err(|_| dispatcher_gone())?
    }

    /// Drop every actor handle so that idle actors and the dispatcher exit.
    ///
    /// Later upserts fail with `ActorUnavailable`.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let count = self.inner.actors.len();
        self.inner.actors.clear();
        debug!("Tracker shut down, released {} actors", count);
    }

    pub fn actor_count(&self) -> usize {
        self.inner.actors.len()
    }
}

/// Serve manifest queries one at a time on the blocking pool
async fn run_manifest_dispatcher(
    provider: Arc<dyn ManifestProvider>,
    mut requests: mpsc::Receiver<ManifestQuery>,
) {
    debug!("Manifest dispatcher started for {}", provider.describe());

    while let Some(ManifestQuery { package, reply }) = requests.recv().await {
        let span = debug_span!("manifest", package = %package);
        let lookup = {
            let provider = Arc::clone(&provider);
            let package = package.clone();
            move || provider.get_manifest(&package.name, &package.version)
        };

        let result = tokio::task::spawn_blocking(lookup)
            .instrument(span)
            .await
            .unwrap_or_else(|e| {
                Err(WeaveError::provider(
                    format!("Manifest lookup for {} panicked", package),
                    e,
                ))
            });

        if reply.send(result).is_err() {
            warn!("Manifest reply for {} dropped, requester went away", package);
        }
    }

    debug!("Manifest dispatcher stopped");
}
