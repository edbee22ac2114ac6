//! Transient store correlating join requests to later member-increase events.
//!
//! Between "someone applied to join" and "that someone is now a member" the
//! only thing worth remembering is the application text. The store keeps it,
//! keyed by applicant account, until the matching member-increase consumes it
//! with [`take_and_remove`](PendingRequestStore::take_and_remove).
//!
//! # Concurrency
//!
//! Keys are sharded over a fixed number of mutex-guarded maps, so unrelated
//! applicants never contend on one lock. `take_and_remove` is linearizable
//! per key: when two consumers race on the same key, exactly one observes the
//! value.
//!
//! # Eviction
//!
//! Applicant ids are externally controlled, so an unbounded map is a
//! resource-exhaustion hazard. Eviction is therefore an explicit policy:
//! an optional per-entry TTL (expired entries read as absent) and an optional
//! capacity bound with oldest-first eviction. Both default to off for small
//! deployments.

use std::collections::HashMap;
use std::hash::{BuildHasher, Hasher, RandomState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use weld_core::AccountId;

// ============================================================================
// Configuration
// ============================================================================

/// Eviction and sharding policy for a [`PendingRequestStore`].
#[derive(Debug, Clone)]
pub struct PendingStoreConfig {
    /// Number of shards. More shards, less cross-key contention.
    pub shards: usize,
    /// Entries older than this read as absent and are dropped.
    pub ttl: Option<Duration>,
    /// Approximate total entry bound; enforced per shard, evicting the
    /// shard's oldest entry when a new key would exceed it.
    pub capacity: Option<usize>,
}

impl Default for PendingStoreConfig {
    fn default() -> Self {
        Self {
            shards: 16,
            ttl: None,
            capacity: None,
        }
    }
}

// ============================================================================
// Store
// ============================================================================

struct Entry {
    text: String,
    inserted_at: Instant,
    /// Monotonic insertion counter, the oldest-first eviction order.
    seq: u64,
}

/// Concurrent key-value cache for pending join-request text.
///
/// See the module docs for the correlation and eviction semantics.
pub struct PendingRequestStore {
    shards: Box<[Mutex<HashMap<AccountId, Entry>>]>,
    hasher: RandomState,
    ttl: Option<Duration>,
    capacity_per_shard: Option<usize>,
    seq: AtomicU64,
}

impl Default for PendingRequestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingRequestStore {
    /// Creates a store with the default policy (16 shards, no eviction).
    pub fn new() -> Self {
        Self::with_config(PendingStoreConfig::default())
    }

    /// Creates a store with an explicit policy.
    pub fn with_config(config: PendingStoreConfig) -> Self {
        let shard_count = config.shards.max(1);
        let shards = (0..shard_count)
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let capacity_per_shard = config
            .capacity
            .map(|total| total.div_ceil(shard_count).max(1));

        Self {
            shards,
            hasher: RandomState::new(),
            ttl: config.ttl,
            capacity_per_shard,
            seq: AtomicU64::new(0),
        }
    }

    fn shard(&self, key: AccountId) -> &Mutex<HashMap<AccountId, Entry>> {
        let mut hasher = self.hasher.build_hasher();
        hasher.write_i64(key.value());
        let index = (hasher.finish() as usize) % self.shards.len();
        &self.shards[index]
    }

    fn is_expired(&self, entry: &Entry) -> bool {
        self.ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() > ttl)
    }

    /// Inserts or overwrites the pending text for an applicant.
    ///
    /// When the capacity bound is reached and `key` is new, the oldest entry
    /// in the key's shard is evicted first.
    pub fn put(&self, key: AccountId, value: impl Into<String>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut shard = self.shard(key).lock();

        if let Some(cap) = self.capacity_per_shard
            && shard.len() >= cap
            && !shard.contains_key(&key)
        {
            if let Some(oldest) = shard
                .iter()
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| *k)
            {
                shard.remove(&oldest);
                debug!(evicted = %oldest, "Pending store at capacity, dropped oldest entry");
            }
        }

        shard.insert(
            key,
            Entry {
                text: value.into(),
                inserted_at: Instant::now(),
                seq,
            },
        );
    }

    /// Atomically reads and deletes the entry for `key`.
    ///
    /// `None` means no text was recorded, the entry expired, or another
    /// caller consumed it first — all equally normal outcomes. No caller
    /// ever observes a value another caller already took.
    pub fn take_and_remove(&self, key: AccountId) -> Option<String> {
        let entry = self.shard(key).lock().remove(&key)?;
        if self.is_expired(&entry) {
            debug!(key = %key, "Pending entry expired before consumption");
            return None;
        }
        Some(entry.text)
    }

    /// Drops every expired entry.
    ///
    /// Expiry is already enforced lazily on read; this exists for periodic
    /// housekeeping when reads are rare. Returns the number of entries
    /// removed.
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else { return 0 };
        let mut removed = 0;
        for shard in &self.shards {
            let mut shard = shard.lock();
            let before = shard.len();
            shard.retain(|_, entry| entry.inserted_at.elapsed() <= ttl);
            removed += before - shard.len();
        }
        if removed > 0 {
            debug!(removed, "Purged expired pending entries");
        }
        removed
    }

    /// Number of stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for PendingRequestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingRequestStore")
            .field("shards", &self.shards.len())
            .field("len", &self.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
