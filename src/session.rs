//! Per-screen wiring of collection, cache, and resolver.
//!
//! A [`Session`] is what a list screen holds for its lifetime: one
//! [`PaginatedCollection`] and one [`ArtifactResolver`] sharing a single
//! [`ObjectCache`]. All three are created together and dropped together.

use std::sync::Arc;

use anyhow::Result;

use crate::cache::ObjectCache;
use crate::collection::PaginatedCollection;
use crate::config::Config;
use crate::download::HttpArtifactSource;
use crate::fetcher::HttpPageFetcher;
use crate::observer::{CollectionObserver, NoObserver};
use crate::resolver::ArtifactResolver;
use crate::traits::{ArtifactSource, PageFetcher};

pub struct Session {
    pub collection: PaginatedCollection,
    pub resolver: ArtifactResolver,
}

impl Session {
    /// Wire a session from arbitrary transports.
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        source: Arc<dyn ArtifactSource>,
        coalesce: bool,
        observer: Box<dyn CollectionObserver>,
    ) -> Self {
        let cache = Arc::new(ObjectCache::new());
        let collection =
            PaginatedCollection::new(fetcher, Arc::clone(&cache)).with_observer(observer);
        let resolver = ArtifactResolver::new(source, cache).with_coalescing(coalesce);
        Self {
            collection,
            resolver,
        }
    }

    /// Wire a session with HTTP transports built from `config`.
    pub fn from_config(config: &Config, observer: Box<dyn CollectionObserver>) -> Result<Self> {
        let fetcher = HttpPageFetcher::new(config.source.clone())?;
        let source = HttpArtifactSource::new(&config.artifacts)?;
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(source),
            config.artifacts.coalesce,
            observer,
        ))
    }

    /// Same as [`from_config`](Self::from_config) with no observer.
    pub fn from_config_quiet(config: &Config) -> Result<Self> {
        Self::from_config(config, Box::new(NoObserver))
    }

    pub fn cache(&self) -> &Arc<ObjectCache> {
        self.resolver.cache()
    }
}
