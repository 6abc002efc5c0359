//! Error types for page and artifact fetching.
//!
//! The two taxonomies propagate differently:
//! [`FetchError`] surfaces to the consumer from
//! [`PaginatedCollection::refresh`](crate::collection::PaginatedCollection::refresh)
//! and [`load_more`](crate::collection::PaginatedCollection::load_more), while
//! [`ArtifactFetchError`] never leaves the
//! [`ArtifactResolver`](crate::resolver::ArtifactResolver); it is logged and
//! replaced by a placeholder artifact.

use thiserror::Error;

/// A page request failed, either on the wire or while decoding the body.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// Connection, TLS, or timeout failure.
    #[error("transport error fetching {url}: {message}")]
    Transport { url: String, message: String },

    /// The origin answered with a non-success status.
    #[error("page request to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was not a page object of the configured shape.
    #[error("malformed page response: {0}")]
    Decode(String),

    /// The endpoint or cursor could not be turned into a request URL.
    #[error("invalid page URL '{0}'")]
    InvalidUrl(String),
}

impl FetchError {
    /// Short, stable label used in observer output.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Status { .. } => "status",
            FetchError::Decode(_) => "decode",
            FetchError::InvalidUrl(_) => "invalid_url",
        }
    }
}

/// Downloading an item's artifact failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ArtifactFetchError {
    #[error("transport error downloading {url}: {message}")]
    Transport { url: String, message: String },

    #[error("artifact download from {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body exceeded `artifacts.max_bytes`.
    #[error("artifact at {url} is {size} bytes, limit is {limit}")]
    TooLarge { url: String, size: u64, limit: u64 },

    #[error("invalid artifact URL '{0}'")]
    InvalidUrl(String),
}
