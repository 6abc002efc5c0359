//! Artifact resolution with cache-first lookup.
//!
//! [`ArtifactResolver::resolve`] is called once per rendered row. A cache
//! hit completes synchronously with no network traffic. A miss spawns a
//! download on the tokio runtime; success is cached under the row's
//! position, failure is logged and reported to the callback as
//! [`Artifact::placeholder`] without touching the cache, so the next
//! render retries.
//!
//! # Coalescing
//!
//! By default two resolves of the same key that overlap both download and
//! the last write wins. With coalescing enabled, a resolve that finds a
//! download already running for the same position *and* URL waits for
//! that download instead. Matching on the URL as well as the position
//! keeps a resolve issued after a refresh from being handed the previous
//! occupant's artifact.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::ObjectCache;
use crate::models::{Artifact, CacheKey, Item};
use crate::traits::ArtifactSource;

type Waiters = HashMap<(CacheKey, String), Vec<oneshot::Sender<Artifact>>>;

/// Owns a coalesced download's waiter queue for the leading task.
///
/// If the task ends without handing out a result (aborted, or the source
/// panicked) the queue is removed on drop. The dropped senders wake every
/// joined waiter with a placeholder and the next resolve starts afresh.
struct Leader {
    in_flight: Arc<Mutex<Waiters>>,
    key: (CacheKey, String),
    armed: bool,
}

impl Leader {
    fn take_waiters(&mut self) -> Vec<oneshot::Sender<Artifact>> {
        self.armed = false;
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key)
            .unwrap_or_default()
    }
}

impl Drop for Leader {
    fn drop(&mut self) {
        if self.armed {
            self.take_waiters();
        }
    }
}

/// How a [`resolve`](ArtifactResolver::resolve) call was satisfied.
#[derive(Debug)]
pub enum Resolution {
    /// Served from the cache; the callback has already run.
    Cached,
    /// A task was spawned; the callback runs when it finishes.
    Pending(JoinHandle<()>),
}

impl Resolution {
    pub fn is_cached(&self) -> bool {
        matches!(self, Resolution::Cached)
    }

    /// Wait until the callback has run.
    pub async fn wait(self) {
        if let Resolution::Pending(handle) = self {
            if let Err(err) = handle.await {
                warn!(error = %err, "artifact task did not complete");
            }
        }
    }
}

/// Produces per-item artifacts, consulting an [`ObjectCache`] first.
pub struct ArtifactResolver {
    source: Arc<dyn ArtifactSource>,
    cache: Arc<ObjectCache>,
    coalesce: bool,
    in_flight: Arc<Mutex<Waiters>>,
}

impl ArtifactResolver {
    pub fn new(source: Arc<dyn ArtifactSource>, cache: Arc<ObjectCache>) -> Self {
        Self {
            source,
            cache,
            coalesce: false,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Share one download between overlapping resolves of the same key.
    pub fn with_coalescing(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }

    pub fn cache(&self) -> &Arc<ObjectCache> {
        &self.cache
    }

    /// Resolve `item`'s artifact for position `key`.
    ///
    /// `on_complete` runs exactly once: inline on a cache hit, otherwise
    /// from a spawned task with either the downloaded artifact or a
    /// placeholder.
    ///
    /// # Panics
    ///
    /// On a cache miss this spawns onto the current tokio runtime and
    /// panics if there is none.
    pub fn resolve<F>(&self, item: &Item, key: CacheKey, on_complete: F) -> Resolution
    where
        F: FnOnce(Artifact) + Send + 'static,
    {
        // Read the generation before the lookup so a clear in between
        // invalidates this resolve's write.
        let generation = self.cache.generation();
        if let Some(artifact) = self.cache.get(key) {
            debug!(key, "artifact cache hit");
            on_complete(artifact);
            return Resolution::Cached;
        }

        let url = item.artifact_url.clone();

        if self.coalesce {
            let mut waiters = self
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(queue) = waiters.get_mut(&(key, url.clone())) {
                debug!(key, url = %url, "joining in-flight artifact download");
                let (tx, rx) = oneshot::channel();
                queue.push(tx);
                return Resolution::Pending(tokio::spawn(async move {
                    on_complete(rx.await.unwrap_or_else(|_| Artifact::placeholder()));
                }));
            }
            waiters.insert((key, url.clone()), Vec::new());
        }

        let source = Arc::clone(&self.source);
        let cache = Arc::clone(&self.cache);
        let mut leader = self.coalesce.then(|| Leader {
            in_flight: Arc::clone(&self.in_flight),
            key: (key, url.clone()),
            armed: true,
        });

        Resolution::Pending(tokio::spawn(async move {
            let artifact =
                download_and_store(source.as_ref(), &cache, &url, key, generation).await;

            if let Some(leader) = leader.as_mut() {
                for tx in leader.take_waiters() {
                    let _ = tx.send(artifact.clone());
                }
            }

            on_complete(artifact);
        }))
    }

    /// Async form of [`resolve`](Self::resolve) that returns the artifact.
    pub async fn resolve_now(&self, item: &Item, key: CacheKey) -> Artifact {
        let (tx, rx) = oneshot::channel();
        self.resolve(item, key, move |artifact| {
            let _ = tx.send(artifact);
        });
        rx.await.unwrap_or_else(|_| Artifact::placeholder())
    }
}

async fn download_and_store(
    source: &dyn ArtifactSource,
    cache: &ObjectCache,
    url: &str,
    key: CacheKey,
    generation: u64,
) -> Artifact {
    match source.download(url).await {
        Ok(artifact) => {
            if !cache.set_if_current(generation, key, artifact.clone()) {
                debug!(key, url, "cache cleared during download, not storing");
            }
            artifact
        }
        Err(err) => {
            warn!(key, url, error = %err, "artifact download failed, using placeholder");
            Artifact::placeholder()
        }
    }
}
