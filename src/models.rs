//! Core data models that flow between the fetcher, collection, and resolver.

use std::sync::Arc;

use sha2::{Digest, Sha256};

/// Opaque continuation token pointing at the next page.
pub type Cursor = String;

/// Position of an item in the current collection; the artifact cache key.
pub type CacheKey = usize;

/// One list entry decoded from a page response.
///
/// Items are immutable once decoded. `name` is the display key and
/// `artifact_url` points at the source of the item's derived artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub name: String,
    pub artifact_url: String,
    /// The full JSON record the item was decoded from.
    pub raw: serde_json::Value,
}

impl Item {
    pub fn new(name: impl Into<String>, artifact_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifact_url: artifact_url.into(),
            raw: serde_json::Value::Null,
        }
    }
}

/// One batch of items plus the cursor for the following batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Item>,
    pub next: Option<Cursor>,
}

impl Page {
    /// Build a page, folding an empty cursor into `None`.
    ///
    /// Origins signal end-of-list either by omitting the cursor or by
    /// sending `""`; both become `None` here so nothing downstream has to
    /// care which one it got.
    pub fn new(items: Vec<Item>, next: Option<Cursor>) -> Self {
        Self {
            items,
            next: next.filter(|c| !c.is_empty()),
        }
    }
}

/// A derived per-item artifact, e.g. a downloaded flag image.
///
/// Bytes are shared, so cloning an artifact out of the cache is cheap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Arc<[u8]>,
    pub content_type: Option<String>,
}

impl Artifact {
    pub fn new(bytes: impl Into<Arc<[u8]>>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    /// The empty artifact handed out when a download fails.
    pub fn placeholder() -> Self {
        Self {
            bytes: Arc::from(Vec::<u8>::new()),
            content_type: None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.bytes.is_empty() && self.content_type.is_none()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Hex-encoded SHA-256 of the artifact bytes.
    pub fn sha256_hex(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes[..]);
        hex::encode(hasher.finalize())
    }
}
