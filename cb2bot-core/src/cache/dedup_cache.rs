//! src/cache/dedup_cache.rs
//!
//! Remembers EventSub message ids so redelivered notifications are acknowledged
//! without being announced twice.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::debug;

use crate::config::DEFAULT_DEDUP_RETENTION_SECS;

/// Sweep expired ids once the map grows past this many entries.
const SWEEP_THRESHOLD: usize = 1024;

pub struct DedupCache {
    seen: DashMap<String, DateTime<Utc>>,
    retention: Duration,
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_RETENTION_SECS)
    }
}

impl DedupCache {
    /// Ids are forgotten `retention_secs` after they were marked. Twitch stops retrying a
    /// message well inside the default window.
    pub fn new(retention_secs: i64) -> Self {
        Self {
            seen: DashMap::new(),
            retention: Duration::seconds(retention_secs.max(1)),
        }
    }

    pub fn is_duplicate(&self, id: &str) -> bool {
        self.is_duplicate_at(id, Utc::now())
    }

    pub fn is_duplicate_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        match self.seen.get(id) {
            Some(seen_at) => now - *seen_at < self.retention,
            None => false,
        }
    }

    pub fn mark_seen(&self, id: &str) {
        self.mark_seen_at(id, Utc::now());
    }

    pub fn mark_seen_at(&self, id: &str, now: DateTime<Utc>) {
        self.seen.insert(id.to_string(), now);
        self.maybe_sweep(now);
    }

    /// Atomically records `id` and reports whether this caller was first.
    ///
    /// Concurrent claims for the same id are serialized on the map shard, so exactly one
    /// of them gets `true`.
    pub fn claim(&self, id: &str) -> bool {
        self.claim_at(id, Utc::now())
    }

    pub fn claim_at(&self, id: &str, now: DateTime<Utc>) -> bool {
        let claimed = match self.seen.entry(id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if now - *occupied.get() < self.retention {
                    false
                } else {
                    occupied.insert(now);
                    true
                }
            }
            Entry::Vacant(vacant) => {
                vacant.insert(now);
                true
            }
        };
        if claimed {
            self.maybe_sweep(now);
        }
        claimed
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Drops every id older than the retention window.
    pub fn evict_expired(&self, now: DateTime<Utc>) {
        let before = self.seen.len();
        let retention = self.retention;
        self.seen.retain(|_, seen_at| now - *seen_at < retention);
        let evicted = before.saturating_sub(self.seen.len());
        if evicted > 0 {
            debug!("DedupCache evicted {} expired message ids", evicted);
        }
    }

    fn maybe_sweep(&self, now: DateTime<Utc>) {
        if self.seen.len() > SWEEP_THRESHOLD {
            self.evict_expired(now);
        }
    }
}
