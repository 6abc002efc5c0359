//! In-memory transports shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pagefeed::error::{ArtifactFetchError, FetchError};
use pagefeed::models::{Artifact, Item, Page};
use pagefeed::traits::{ArtifactSource, PageFetcher};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub fn item(name: &str) -> Item {
    Item::new(name, format!("https://flags.example/{}.png", name.to_lowercase()))
}

pub fn page(names: &[&str], next: Option<&str>) -> Page {
    Page::new(
        names.iter().map(|n| item(n)).collect(),
        next.map(str::to_string),
    )
}

pub fn names(items: &[Arc<Item>]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

// ─── Page fetchers ──────────────────────────────────────────────────

/// Replays a fixed list of responses and records every cursor it was given.
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Page, FetchError>>>,
    calls: Mutex<Vec<Option<String>>>,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<Page, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Option<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push(cursor.map(str::to_string));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::Decode("script exhausted".to_string())))
    }
}

/// Blocks every fetch until [`release`](GatedFetcher::release) is called,
/// so a test can act while a load is in flight.
pub struct GatedFetcher {
    inner: Arc<ScriptedFetcher>,
    started: Notify,
    gate: Notify,
}

impl GatedFetcher {
    pub fn new(responses: Vec<Result<Page, FetchError>>) -> Arc<Self> {
        Arc::new(Self {
            inner: ScriptedFetcher::new(responses),
            started: Notify::new(),
            gate: Notify::new(),
        })
    }

    /// Wait until a fetch has begun.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> Vec<Option<String>> {
        self.inner.calls()
    }
}

#[async_trait]
impl PageFetcher for GatedFetcher {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page, FetchError> {
        self.started.notify_one();
        self.gate.notified().await;
        self.inner.fetch(cursor).await
    }
}

// ─── Artifact sources ───────────────────────────────────────────────

/// Returns the URL bytes as the artifact; URLs containing "broken" fail.
/// Optionally holds every download until released.
pub struct FakeSource {
    downloads: AtomicUsize,
    gated: bool,
    started: Notify,
    gate: Notify,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            downloads: AtomicUsize::new(0),
            gated: false,
            started: Notify::new(),
            gate: Notify::new(),
        })
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            downloads: AtomicUsize::new(0),
            gated: true,
            started: Notify::new(),
            gate: Notify::new(),
        })
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Let every currently blocked download finish.
    pub fn release_all(&self) {
        self.gate.notify_waiters();
    }
}

#[async_trait]
impl ArtifactSource for FakeSource {
    async fn download(&self, url: &str) -> Result<Artifact, ArtifactFetchError> {
        if self.gated {
            let released = self.gate.notified();
            tokio::pin!(released);
            released.as_mut().enable();
            self.downloads.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            released.await;
        } else {
            self.downloads.fetch_add(1, Ordering::SeqCst);
        }

        if url.contains("broken") {
            return Err(ArtifactFetchError::Status {
                url: url.to_string(),
                status: 404,
            });
        }
        Ok(Artifact::new(
            url.as_bytes().to_vec(),
            Some("image/png".to_string()),
        ))
    }
}
