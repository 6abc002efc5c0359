//! Transport seams for the loading pipeline.
//!
//! The collection and resolver never talk to the network directly. They go
//! through two traits so the transport can be swapped out (HTTP in the
//! binary, in-memory doubles in tests):
//!
//! ```text
//!   PaginatedCollection ──fetch(cursor)──▶ PageFetcher    ──▶ origin API
//!   ArtifactResolver    ──download(url)──▶ ArtifactSource ──▶ CDN / origin
//! ```
//!
//! # Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use pagefeed::error::FetchError;
//! use pagefeed::models::{Item, Page};
//! use pagefeed::traits::PageFetcher;
//!
//! struct SinglePage;
//!
//! #[async_trait]
//! impl PageFetcher for SinglePage {
//!     async fn fetch(&self, _cursor: Option<&str>) -> Result<Page, FetchError> {
//!         Ok(Page::new(vec![Item::new("Aruba", "https://flags.example/aw.png")], None))
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::{ArtifactFetchError, FetchError};
use crate::models::{Artifact, Page};

/// Fetches one page of items.
///
/// # Contract
///
/// - `cursor = None` requests the first page.
/// - Single-shot: no retries, no caching, no merging.
/// - Failures are returned, never panicked; the caller's state is not
///   touched by the fetcher.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, cursor: Option<&str>) -> Result<Page, FetchError>;
}

/// Downloads the raw bytes of an item's derived artifact.
#[async_trait]
pub trait ArtifactSource: Send + Sync {
    async fn download(&self, url: &str) -> Result<Artifact, ArtifactFetchError>;
}
