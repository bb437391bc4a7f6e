//! Per-key result cache that drops superseded loads.
//!
//! A load starts with [`GenerationCache::begin`], which hands out a ticket
//! carrying a fresh generation number for the key. Only the newest ticket of
//! a key may store its result; an older load finishing late (say, the user
//! switched the window and back while it was in flight) is discarded.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

/// Handle for one in-flight load of `key`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    generation: u64,
}

impl<K> Ticket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: Arc<V>,
    stored_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Slot<V> {
    latest: u64,
    entry: Option<Entry<V>>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            latest: 0,
            entry: None,
        }
    }
}

/// Thread-safe cache keyed by `K`. No lock is held across an await.
#[derive(Debug)]
pub struct GenerationCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for GenerationCache<K, V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> GenerationCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        // A panic while holding the lock cannot leave a slot half-written.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a load of `key`, superseding any load already in flight.
    pub fn begin(&self, key: K) -> Ticket<K> {
        let mut slots = self.lock();
        let slot = slots.entry(key.clone()).or_default();
        slot.latest += 1;
        Ticket {
            key,
            generation: slot.latest,
        }
    }

    /// Whether `ticket` is still the newest load of its key.
    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.lock()
            .get(&ticket.key)
            .is_some_and(|slot| slot.latest == ticket.generation)
    }

    /// Store the result of a load. Returns `false`, storing nothing, if a
    /// newer load of the same key has begun since.
    pub fn complete(&self, ticket: Ticket<K>, value: V) -> bool {
        self.complete_at(ticket, value, Utc::now())
    }

    pub fn complete_at(&self, ticket: Ticket<K>, value: V, now: DateTime<Utc>) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&ticket.key) else {
            debug!(key = ?ticket.key, generation = ticket.generation, "stale load discarded");
            return false;
        };
        if slot.latest != ticket.generation {
            debug!(
                key = ?ticket.key,
                generation = ticket.generation,
                latest = slot.latest,
                "stale load discarded"
            );
            return false;
        }
        slot.entry = Some(Entry {
            value: Arc::new(value),
            stored_at: now,
        });
        true
    }

    /// Cached value of `key`, if present and no older than `max_age`.
    pub fn get(&self, key: &K, max_age: Option<Duration>) -> Option<Arc<V>> {
        self.get_as_of(key, max_age, Utc::now())
    }

    pub fn get_as_of(&self, key: &K, max_age: Option<Duration>, now: DateTime<Utc>) -> Option<Arc<V>> {
        let slots = self.lock();
        let entry = slots.get(key)?.entry.as_ref()?;
        if let Some(max_age) = max_age {
            let age = now.signed_duration_since(entry.stored_at);
            // Negative age (clock moved back) counts as fresh.
            if age.to_std().is_ok_and(|age| age > max_age) {
                return None;
            }
        }
        Some(Arc::clone(&entry.value))
    }

    /// Drop the cached value of `key` and supersede loads in flight.
    pub fn invalidate(&self, key: &K) {
        if let Some(slot) = self.lock().get_mut(key) {
            slot.latest += 1;
            slot.entry = None;
        }
    }
}
