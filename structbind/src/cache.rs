//! Concurrency-safe memoizing cache.
//!
//! [`Cache::get_or_set`] guarantees that, for a given key, the compute function runs to completion
//! and its result is published once even when many threads ask for the same key at the same time.
//! Late arrivals wait on a per-key lock and observe the published value; different keys never wait
//! on each other's computation.
//!
//! Entries may carry an expiry hint. Metadata tables never expire, but other users of the cache can
//! ask for time-bounded entries.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn new(value: V, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| now < deadline)
    }
}

type Slot<V> = Arc<Mutex<Option<Entry<V>>>>;

pub struct Cache<K, V> {
    slots: RwLock<HashMap<K, Slot<V>>>,
}

impl<K, V> Default for Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, computing and storing it first when absent or expired.
    ///
    /// `compute` returns the value and an optional time-to-live. An error is handed back to the
    /// caller and nothing is stored. A panic inside `compute` leaves the key empty, so the next
    /// caller computes again.
    pub fn get_or_set<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce(&K) -> Result<(V, Option<Duration>), E>,
    {
        let slot = self.slot(&key);
        let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = state.as_ref()
            && entry.is_live(Instant::now())
        {
            return Ok(entry.value.clone());
        }

        *state = None;
        let (value, ttl) = compute(&key)?;
        *state = Some(Entry::new(value.clone(), ttl));
        Ok(value)
    }

    /// Returns the value for `key` if present and not expired. Never waits for a running computation
    /// of another key, but does wait for one running on `key` itself.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.get(key)?)
        };
        let state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .as_ref()
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key`, replacing whatever was there.
    pub fn set(&self, key: K, value: V, ttl: Option<Duration>) {
        let slot = self.slot(&key);
        let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
        *state = Some(Entry::new(value, ttl));
    }

    pub fn remove(&self, key: &K) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).remove(key);
    }

    /// Drops every entry.
    pub fn reset(&self) {
        self.slots.write().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Number of keys with a live value.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| match slot.try_lock() {
                Ok(state) => state.as_ref().is_some_and(|entry| entry.is_live(now)),
                Err(_) => false,
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &K) -> Slot<V> {
        {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(slot) = slots.get(key) {
                return Arc::clone(slot);
            }
        }
        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(key.clone()).or_default())
    }
}
