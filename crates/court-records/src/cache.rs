//! TTL result cache keyed by strategy fingerprint.
//!
//! Entries are only visible while younger than their TTL. Expired entries
//! read as absent and are dropped on the next read of that key or on
//! `sweep()`. Case-number and party-name lookups of the same case live
//! under different fingerprints on purpose: the upstream tiers do not return
//! identical records.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

/// Deterministic cache key for one (strategy, normalized query) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Build a fingerprint from a strategy id and its query parameters.
    ///
    /// Parameters are sorted by name so argument order never changes the key.
    pub fn new(strategy_id: &str, params: &[(&str, &str)]) -> Self {
        let mut params: Vec<_> = params.to_vec();
        params.sort();
        let query = params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        Self(format!("{strategy_id}?{query}"))
    }

    pub fn strategy_id(&self) -> &str {
        self.0.split('?').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

struct CacheEntry<V> {
    data: V,
    stored_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// Hit/miss counters for the cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// In-memory TTL cache.
pub struct ResultCache<V> {
    entries: Mutex<HashMap<Fingerprint, CacheEntry<V>>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> ResultCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Get a fresh entry, purging it if it has expired.
    pub fn get(&self, key: &Fingerprint) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.data.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };
        drop(entries);

        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Store a value, replacing any previous entry under the same key.
    pub fn put(&self, key: Fingerprint, data: V, ttl: Duration) {
        let entry = CacheEntry {
            data,
            stored_at: Instant::now(),
            ttl,
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, entry);
    }

    /// Store a value with the default TTL.
    pub fn put_default(&self, key: Fingerprint, data: V) {
        self.put(key, data, self.default_ttl);
    }

    /// Remove one entry. Returns whether anything was removed.
    pub fn invalidate(&self, key: &Fingerprint) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Remove every entry whose value matches `pred`.
    pub fn invalidate_where<F>(&self, pred: F) -> usize
    where
        F: Fn(&V) -> bool,
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !pred(&entry.data));
        before - entries.len()
    }

    /// Drop all expired entries. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("cache sweep removed {removed} expired entries");
        }
        removed
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
