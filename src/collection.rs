//! The paginated item collection.
//!
//! [`PaginatedCollection`] owns the merged, ordered item sequence and the
//! continuation cursor, and is the only thing that mutates either. It loads
//! in two ways:
//!
//! - **refresh**: fetch the first page and *replace* the sequence with it,
//!   clearing the artifact cache since every position now means something
//!   else;
//! - **load more**: fetch the page after the cursor and *append* it.
//!
//! # State Machine
//!
//! ```text
//!            refresh()              load_more()
//!   Idle ───────────────▶ Refreshing      Idle ───────────────▶ Appending
//!    ▲                        │            ▲                        │
//!    └──── success/failure ───┘            └──── success/failure ───┘
//! ```
//!
//! Both loads start only from `Idle`. A call that arrives while another load
//! is in flight returns [`LoadOutcome::Skipped`] without fetching, so two
//! fetches never race on the sequence. The return to `Idle` is tied to a
//! drop guard, so it also happens if the load future is dropped mid-fetch.
//!
//! # Infinite Scroll
//!
//! A consumer calls [`should_load_more`](PaginatedCollection::should_load_more)
//! for every row it renders; it is true only for the last known row while a
//! cursor is present.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::cache::ObjectCache;
use crate::error::FetchError;
use crate::models::{Cursor, Item};
use crate::observer::{CollectionEvent, CollectionObserver, LoadKind, NoObserver};
use crate::traits::PageFetcher;

/// Where the collection is in its load cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Idle,
    Refreshing,
    Appending,
}

/// Why a load call did nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// Another load was in flight.
    Busy,
    /// No cursor: the last page has been loaded.
    EndOfList,
}

/// Result of a load call that did not fail.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LoadOutcome {
    Refreshed { count: usize },
    Appended { added: usize, total: usize },
    Skipped(SkipReason),
}

struct State {
    items: Vec<Arc<Item>>,
    cursor: Option<Cursor>,
    phase: Phase,
}

/// Resets the phase to `Idle` when dropped.
struct InFlight<'a> {
    state: &'a Mutex<State>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .phase = Phase::Idle;
    }
}

/// Ordered, cursor-paginated item list.
pub struct PaginatedCollection {
    fetcher: Arc<dyn PageFetcher>,
    cache: Arc<ObjectCache>,
    observer: Box<dyn CollectionObserver>,
    state: Mutex<State>,
}

impl PaginatedCollection {
    /// Create an empty collection. `cache` is cleared on every successful
    /// refresh; share it with the [`ArtifactResolver`](crate::resolver::ArtifactResolver).
    pub fn new(fetcher: Arc<dyn PageFetcher>, cache: Arc<ObjectCache>) -> Self {
        Self {
            fetcher,
            cache,
            observer: Box::new(NoObserver),
            state: Mutex::new(State {
                items: Vec::new(),
                cursor: None,
                phase: Phase::Idle,
            }),
        }
    }

    pub fn with_observer(mut self, observer: Box<dyn CollectionObserver>) -> Self {
        self.observer = observer;
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reload from the first page, replacing the current items.
    ///
    /// On failure the visible items and cursor are left exactly as they
    /// were. Either way the collection is back in [`Phase::Idle`] when this
    /// returns, so a refresh spinner can be stopped unconditionally.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] from the page fetcher.
    pub async fn refresh(&self) -> Result<LoadOutcome, FetchError> {
        let in_flight = {
            let mut state = self.lock();
            if state.phase != Phase::Idle {
                debug!(phase = ?state.phase, "refresh ignored, load in flight");
                return Ok(LoadOutcome::Skipped(SkipReason::Busy));
            }
            state.phase = Phase::Refreshing;
            InFlight { state: &self.state }
        };

        let fetched = self.fetcher.fetch(None).await;

        let result = fetched.map(|page| {
            let mut state = self.lock();
            let count = page.items.len();
            state.items = page.items.into_iter().map(Arc::new).collect();
            state.cursor = page.next;
            self.cache.clear();
            (
                LoadOutcome::Refreshed { count },
                CollectionEvent::Refreshed {
                    count,
                    has_more: state.cursor.is_some(),
                },
            )
        });

        drop(in_flight);
        self.finish(LoadKind::Refresh, result)
    }

    /// Fetch the page after the current cursor and append it.
    ///
    /// Does nothing (returns [`LoadOutcome::Skipped`]) when no cursor is
    /// present or another load is in flight. On failure items and cursor
    /// are unchanged, so calling again retries the same page.
    ///
    /// # Errors
    ///
    /// Returns the [`FetchError`] from the page fetcher.
    pub async fn load_more(&self) -> Result<LoadOutcome, FetchError> {
        let (in_flight, cursor) = {
            let mut state = self.lock();
            if state.phase != Phase::Idle {
                debug!(phase = ?state.phase, "load_more ignored, load in flight");
                return Ok(LoadOutcome::Skipped(SkipReason::Busy));
            }
            let cursor = match &state.cursor {
                Some(c) => c.clone(),
                None => return Ok(LoadOutcome::Skipped(SkipReason::EndOfList)),
            };
            state.phase = Phase::Appending;
            (InFlight { state: &self.state }, cursor)
        };

        let fetched = self.fetcher.fetch(Some(cursor.as_str())).await;

        let result = fetched.map(|page| {
            let mut state = self.lock();
            let added = page.items.len();
            state.items.extend(page.items.into_iter().map(Arc::new));
            state.cursor = page.next;
            let total = state.items.len();
            (
                LoadOutcome::Appended { added, total },
                CollectionEvent::Appended {
                    added,
                    total,
                    has_more: state.cursor.is_some(),
                },
            )
        });

        drop(in_flight);
        self.finish(LoadKind::Append, result)
    }

    fn finish(
        &self,
        kind: LoadKind,
        result: Result<(LoadOutcome, CollectionEvent), FetchError>,
    ) -> Result<LoadOutcome, FetchError> {
        match result {
            Ok((outcome, event)) => {
                info!(load = kind.as_str(), ?outcome, "load complete");
                self.observer.on_event(&event);
                Ok(outcome)
            }
            Err(err) => {
                warn!(load = kind.as_str(), error = %err, "load failed");
                self.observer.on_event(&CollectionEvent::failed(kind, &err));
                Err(err)
            }
        }
    }

    pub fn item_count(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// The item at `index`, or `None` past the end.
    pub fn item(&self, index: usize) -> Option<Arc<Item>> {
        self.lock().items.get(index).cloned()
    }

    /// Snapshot of the whole sequence.
    pub fn items(&self) -> Vec<Arc<Item>> {
        self.lock().items.clone()
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.lock().cursor.clone()
    }

    pub fn has_more(&self) -> bool {
        self.lock().cursor.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() != Phase::Idle
    }

    /// True iff `index` is the last known item and another page exists.
    pub fn should_load_more(&self, index: usize) -> bool {
        let state = self.lock();
        state.cursor.is_some() && !state.items.is_empty() && index == state.items.len() - 1
    }
}
