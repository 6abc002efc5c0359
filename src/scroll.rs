//! Headless infinite-scroll driver.
//!
//! Plays the part of a list view scrolled to the bottom: refresh, then for
//! as long as the last row says [`should_load_more`], load the next page.
//! Used by the CLI and handy in tests.
//!
//! [`should_load_more`]: PaginatedCollection::should_load_more

use tracing::warn;

use crate::collection::{LoadOutcome, PaginatedCollection};
use crate::error::FetchError;

/// What a [`scroll_to_end`] run loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollSummary {
    pub pages: usize,
    pub items: usize,
    pub reached_end: bool,
}

/// Refresh, then append pages until the cursor runs out or `max_pages`
/// pages (including the first) have been loaded.
///
/// Stops early if the origin hands back the cursor it was just given, which
/// would otherwise loop forever.
///
/// # Errors
///
/// Returns the first [`FetchError`]; pages loaded before it stay in the
/// collection.
pub async fn scroll_to_end(
    collection: &PaginatedCollection,
    max_pages: Option<usize>,
) -> Result<ScrollSummary, FetchError> {
    let mut pages = match collection.refresh().await? {
        LoadOutcome::Refreshed { .. } => 1,
        _ => 0,
    };

    while max_pages.map_or(true, |max| pages < max) {
        let count = collection.item_count();
        if count == 0 || !collection.should_load_more(count - 1) {
            break;
        }

        let before = collection.cursor();
        match collection.load_more().await? {
            LoadOutcome::Appended { .. } => pages += 1,
            _ => break,
        }

        if before.is_some() && collection.cursor() == before {
            warn!(cursor = ?before, "origin repeated its cursor, stopping");
            break;
        }
    }

    Ok(ScrollSummary {
        pages,
        items: collection.item_count(),
        reached_end: !collection.has_more(),
    })
}
