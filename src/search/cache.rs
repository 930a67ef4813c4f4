//! Result cache with lazy TTL expiry and oldest-entry eviction.
//!
//! Entries live in an unbounded [`LruCache`] so that reads move them to the
//! most-recent end. Capacity is enforced here rather than by the LRU itself:
//! when a new key would overflow `max_size`, the entry with the smallest
//! insertion timestamp is evicted, regardless of how recently it was read.
//!
//! Expiry is lazy. Every `get`, `has` and `set` first purges everything older
//! than the TTL, so no background task is needed.

use lru::LruCache;
use std::time::{Duration, Instant};

use super::clock::{Clock, SystemClock};
use crate::model::types::{Candidate, CandidateId};

const CACHE_KEY_VERSION: &str = "1";

/// Number of leading candidate ids folded into a fingerprint.
const FINGERPRINT_SAMPLE: usize = 3;

/// Cheap summary of a candidate snapshot: its size and first few ids.
///
/// Two different snapshots can share a fingerprint; the orchestrator clears
/// the cache whenever the snapshot itself is replaced.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    count: usize,
    sample: Vec<CandidateId>,
}

impl Fingerprint {
    pub fn of(candidates: &[Candidate]) -> Self {
        Self {
            count: candidates.len(),
            sample: candidates
                .iter()
                .take(FINGERPRINT_SAMPLE)
                .map(|c| c.id.clone())
                .collect(),
        }
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.count)?;
        for (i, id) in self.sample.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(id.as_str())?;
        }
        Ok(())
    }
}

/// Cache key for a normalized query against a candidate snapshot.
pub fn cache_key(normalized_query: &str, fingerprint: &Fingerprint) -> String {
    format!("v{CACHE_KEY_VERSION}|{normalized_query}|{fingerprint}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub len: usize,
    pub max_size: usize,
}

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
    /// Insertion order; breaks ties between equal timestamps.
    seq: u64,
}

pub struct ResultCache<V, C: Clock = SystemClock> {
    entries: LruCache<String, CacheEntry<V>>,
    ttl: Duration,
    max_size: usize,
    clock: C,
    next_seq: u64,
    hits: u64,
    misses: u64,
    insertions: u64,
    evictions: u64,
    expirations: u64,
}

impl<V: Clone> ResultCache<V, SystemClock> {
    pub fn new(ttl: Duration, max_size: usize) -> Self {
        Self::with_clock(ttl, max_size, SystemClock)
    }
}

impl<V: Clone, C: Clock> ResultCache<V, C> {
    /// `max_size` is clamped to at least one entry.
    pub fn with_clock(ttl: Duration, max_size: usize, clock: C) -> Self {
        Self {
            entries: LruCache::unbounded(),
            ttl,
            max_size: max_size.max(1),
            clock,
            next_seq: 0,
            hits: 0,
            misses: 0,
            insertions: 0,
            evictions: 0,
            expirations: 0,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        self.purge_expired();
        match self.entries.get(key) {
            Some(entry) => {
                self.hits += 1;
                Some(entry.value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn has(&mut self, key: &str) -> bool {
        self.purge_expired();
        self.entries.contains(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.purge_expired();
        let key = key.into();
        if !self.entries.contains(key.as_str()) && self.entries.len() >= self.max_size {
            self.evict_oldest();
        }

        let entry = CacheEntry {
            value,
            stored_at: self.clock.now(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.insertions += 1;
        self.entries.put(key, entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.entries
            .iter()
            .filter(|(_, entry)| !self.is_expired(entry, now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            insertions: self.insertions,
            evictions: self.evictions,
            expirations: self.expirations,
            len: self.len(),
            max_size: self.max_size,
        }
    }

    fn is_expired(&self, entry: &CacheEntry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) > self.ttl
    }

    fn purge_expired(&mut self) {
        let now = self.clock.now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| self.is_expired(entry, now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.entries.pop(key.as_str());
        }
        if !expired.is_empty() {
            self.expirations += expired.len() as u64;
            tracing::trace!(count = expired.len(), "cache_expire");
        }
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, entry)| (entry.stored_at, entry.seq))
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            self.entries.pop(key.as_str());
            self.evictions += 1;
            tracing::debug!(key = %key, "cache_evict");
        }
    }
}
