//! # pagefeed
//!
//! Cursor-paginated list loading with position-keyed artifact caching.
//!
//! pagefeed is the data layer behind an infinite-scroll list: it fetches
//! pages of items from a JSON API, follows the continuation cursor, merges
//! pages into one ordered sequence, and resolves a derived artifact (such as
//! a flag image) for every row through a cache that is reset whenever the
//! list is refreshed.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  fetch(cursor)  ┌─────────────────────┐
//! │ PageFetcher  │◀────────────────│ PaginatedCollection │──┐ clear()
//! └──────────────┘                 └─────────────────────┘  │ on refresh
//!                                                            ▼
//! ┌────────────────┐ download(url) ┌──────────────────┐  ┌─────────────┐
//! │ ArtifactSource │◀──────────────│ ArtifactResolver │─▶│ ObjectCache │
//! └────────────────┘               └──────────────────┘  └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! pagefeed list --pages 3
//! pagefeed list --json
//! pagefeed artifacts --out ./flags
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Items, pages, artifacts |
//! | [`error`] | Fetch error taxonomy |
//! | [`traits`] | Transport seams |
//! | [`fetcher`] | HTTP page fetcher and page decoding |
//! | [`download`] | HTTP artifact downloads |
//! | [`cache`] | Position-keyed artifact cache |
//! | [`collection`] | Refresh / load-more state machine |
//! | [`resolver`] | Cache-first artifact resolution |
//! | [`observer`] | Load completion reporting |
//! | [`session`] | Per-screen wiring |
//! | [`scroll`] | Headless infinite-scroll driver |

pub mod artifacts_cmd;
pub mod cache;
pub mod collection;
pub mod config;
pub mod download;
pub mod error;
pub mod fetcher;
pub mod list_cmd;
pub mod models;
pub mod observer;
pub mod resolver;
pub mod scroll;
pub mod session;
pub mod traits;
