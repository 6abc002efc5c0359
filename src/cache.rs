//! Position-keyed artifact cache.
//!
//! Holds one [`Artifact`] per item position. There is no eviction; the
//! cache is bounded by the collection size and emptied with
//! [`ObjectCache::clear`] whenever the collection is refreshed, because a
//! refresh reassigns every position to new content.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` so the resolver's download
//! tasks can write from any tokio worker.
//!
//! # Generations
//!
//! Every `clear` starts a new generation. A download begun before a refresh
//! may finish after it; [`ObjectCache::set_if_current`] drops such writes
//! instead of filing an old item's artifact under a position that now
//! belongs to a different item.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::models::{Artifact, CacheKey};

struct Slots {
    generation: u64,
    entries: HashMap<CacheKey, Artifact>,
}

/// In-memory artifact store keyed by item position.
pub struct ObjectCache {
    slots: RwLock<Slots>,
}

impl ObjectCache {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(Slots {
                generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    pub fn get(&self, key: CacheKey) -> Option<Artifact> {
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots.entries.get(&key).cloned()
    }

    /// Store an artifact unconditionally; last write wins.
    pub fn set(&self, key: CacheKey, artifact: Artifact) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entries.insert(key, artifact);
    }

    /// Store an artifact only if no `clear` happened since `generation`
    /// was read. Returns whether the write landed.
    pub fn set_if_current(&self, generation: u64, key: CacheKey, artifact: Artifact) -> bool {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        if slots.generation != generation {
            return false;
        }
        slots.entries.insert(key, artifact);
        true
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        slots.entries.clear();
        slots.generation += 1;
    }

    pub fn generation(&self) -> u64 {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ObjectCache {
    fn default() -> Self {
        Self::new()
    }
}
