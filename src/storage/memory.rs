//! Thread-Safe In-Memory Storage Engine
//!
//! This module implements [`MemoryStorage`], the in-memory [`Storage`]
//! backend. It keeps every entry in `items` and additionally indexes the
//! entries that carry a TTL in `items_with_ttl`, so an expiry sweeper can
//! find candidates without scanning the whole keyspace.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Keys are spread over independent shards to reduce contention.
//! 2. **Dual Maps Per Shard**: Each shard owns both `items` and `items_with_ttl`
//!    behind a single `RwLock`, so the two can never be observed out of sync.
//! 3. **Lazy Expiry**: Expired entries read as absent. They are only removed
//!    by an explicit delete, an update that returns no value, or
//!    [`Storage::purge_expired`].
//! 4. **Shared Values**: Both maps hold the same `Arc<Value>` for a key.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        MemoryStorage                         │
//! │  ┌──────────────┐ ┌──────────────┐       ┌──────────────┐    │
//! │  │   Shard 0    │ │   Shard 1    │  ...  │   Shard N    │    │
//! │  │   RwLock     │ │   RwLock     │       │   RwLock     │    │
//! │  │ items        │ │ items        │       │ items        │    │
//! │  │ items_w_ttl  │ │ items_w_ttl  │       │ items_w_ttl  │    │
//! │  └──────────────┘ └──────────────┘       └──────────────┘    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! `put` holds one shard's write lock across the whole read-modify-write.
//! Enumerations take read locks on every shard, in index order, before
//! copying anything, which yields a point-in-time snapshot. Writers never
//! hold more than one shard lock, so this ordering cannot deadlock.

use super::{Key, Result, Storage, StorageError, Value};
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, trace};

/// Default number of shards.
/// More shards = less lock contention, but more memory overhead.
pub const DEFAULT_SHARDS: usize = 64;

/// Configuration for [`MemoryStorage`].
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Number of independently locked shards (default: 64, minimum: 1)
    pub shards: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
        }
    }
}

/// The two maps owned by a shard.
///
/// Invariant: every key in `items_with_ttl` is also in `items`, mapped to
/// the same TTL-bearing value, and every TTL-bearing entry of `items` is
/// in `items_with_ttl`.
#[derive(Debug, Default)]
struct ShardMaps {
    items: HashMap<Key, Arc<Value>>,
    items_with_ttl: HashMap<Key, Arc<Value>>,
}

impl ShardMaps {
    fn insert(&mut self, key: Key, value: Arc<Value>) {
        if value.has_ttl() {
            self.items_with_ttl.insert(key.clone(), Arc::clone(&value));
        } else {
            self.items_with_ttl.remove(&key);
        }
        self.items.insert(key, value);
    }

    fn remove(&mut self, key: &Key) -> bool {
        self.items_with_ttl.remove(key);
        self.items.remove(key).is_some()
    }
}

#[derive(Debug, Default)]
struct Shard {
    maps: RwLock<ShardMaps>,
}

impl Shard {
    // Mutations only happen after the caller's update closure returns, so a
    // poisoned lock still guards consistent maps.
    fn read(&self) -> RwLockReadGuard<'_, ShardMaps> {
        self.maps.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ShardMaps> {
        self.maps.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Storage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub puts: u64,
    pub rejected_puts: u64,
    pub gets: u64,
    pub dels: u64,
    pub purged_expired: u64,
}

/// The in-memory storage engine.
///
/// Designed to be wrapped in an `Arc` and shared by every client task.
///
/// # Example
///
/// ```
/// use ttlkv::storage::{Key, MemoryStorage, Storage, StorageError, Value};
/// use std::time::Duration;
///
/// let storage = MemoryStorage::new();
///
/// storage
///     .put(Key::from("session"), |_| {
///         Ok::<_, StorageError>(Some(Value::string("abc123").with_ttl(Duration::from_secs(60))))
///     })
///     .unwrap();
///
/// let value = storage.get(&Key::from("session")).unwrap();
/// assert_eq!(value.as_string().map(|s| &s[..]), Some(&b"abc123"[..]));
/// assert_eq!(storage.all_with_ttl().unwrap().len(), 1);
/// ```
pub struct MemoryStorage {
    shards: Vec<Shard>,

    put_count: AtomicU64,
    rejected_count: AtomicU64,
    get_count: AtomicU64,
    del_count: AtomicU64,
    purged_count: AtomicU64,
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("shards", &self.shards.len())
            .field("put_count", &self.put_count.load(Ordering::Relaxed))
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Creates an empty storage with default settings.
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    /// Creates an empty storage with the given configuration.
    pub fn with_config(config: StorageConfig) -> Self {
        let shards = (0..config.shards.max(1)).map(|_| Shard::default()).collect();

        Self {
            shards,
            put_count: AtomicU64::new(0),
            rejected_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            purged_count: AtomicU64::new(0),
        }
    }

    /// Creates a storage seeded with `initial`.
    ///
    /// Every entry lands in `items`; the ones carrying a TTL are also
    /// indexed. Expired seed entries are kept, just like any other
    /// not-yet-purged entry.
    pub fn from_items<I>(initial: I) -> Self
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        Self::from_items_with_config(initial, StorageConfig::default())
    }

    /// Creates a storage seeded with `initial` using the given configuration.
    pub fn from_items_with_config<I>(initial: I, config: StorageConfig) -> Self
    where
        I: IntoIterator<Item = (Key, Value)>,
    {
        let storage = Self::with_config(config);
        let mut seeded = 0usize;

        for (key, value) in initial {
            storage.get_shard(&key).write().insert(key, Arc::new(value));
            seeded += 1;
        }

        debug!(
            shards = storage.shards.len(),
            seeded,
            with_ttl = storage.len_with_ttl(),
            "Memory storage initialized"
        );
        storage
    }

    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    #[inline]
    fn get_shard(&self, key: &Key) -> &Shard {
        &self.shards[self.shard_index(key.as_bytes())]
    }

    /// Read-locks every shard, in index order.
    fn read_all(&self) -> Vec<RwLockReadGuard<'_, ShardMaps>> {
        self.shards.iter().map(Shard::read).collect()
    }

    /// Returns the number of stored entries, including expired entries
    /// that have not been purged yet.
    pub fn len(&self) -> usize {
        self.read_all().iter().map(|maps| maps.items.len()).sum()
    }

    /// Returns the number of entries that carry a TTL.
    pub fn len_with_ttl(&self) -> usize {
        self.read_all()
            .iter()
            .map(|maps| maps.items_with_ttl.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every entry.
    pub fn flush(&self) {
        for shard in &self.shards {
            let mut maps = shard.write();
            maps.items.clear();
            maps.items_with_ttl.clear();
        }
        debug!("Memory storage flushed");
    }

    pub fn stats(&self) -> StorageStats {
        StorageStats {
            puts: self.put_count.load(Ordering::Relaxed),
            rejected_puts: self.rejected_count.load(Ordering::Relaxed),
            gets: self.get_count.load(Ordering::Relaxed),
            dels: self.del_count.load(Ordering::Relaxed),
            purged_expired: self.purged_count.load(Ordering::Relaxed),
        }
    }
}

impl Storage for MemoryStorage {
    fn put<F, E>(&self, key: Key, update: F) -> Result<(), E>
    where
        F: FnOnce(Option<&Value>) -> Result<Option<Value>, E>,
    {
        self.put_count.fetch_add(1, Ordering::Relaxed);

        let mut maps = self.get_shard(&key).write();
        let now = Instant::now();

        let current = maps
            .items
            .get(&key)
            .filter(|value| !value.is_expired(now))
            .map(Arc::as_ref);

        match update(current) {
            Err(err) => {
                self.rejected_count.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Update rejected, entry left unchanged");
                Err(err)
            }
            Ok(None) => {
                let removed = maps.remove(&key);
                trace!(key = %key, removed, "Put removed entry");
                Ok(())
            }
            Ok(Some(value)) => {
                trace!(key = %key, kind = %value.kind(), ttl = value.has_ttl(), "Put stored entry");
                maps.insert(key, Arc::new(value));
                Ok(())
            }
        }
    }

    fn get(&self, key: &Key) -> Result<Arc<Value>> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let maps = self.get_shard(key).read();
        let now = Instant::now();

        match maps.items.get(key) {
            Some(value) if !value.is_expired(now) => Ok(Arc::clone(value)),
            _ => {
                trace!(key = %key, "Get missed");
                Err(StorageError::KeyNotFound(key.clone()))
            }
        }
    }

    fn del(&self, key: &Key) -> Result<()> {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let removed = self.get_shard(key).write().remove(key);
        trace!(key = %key, removed, "Del");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<Key>> {
        let now = Instant::now();

        Ok(self
            .read_all()
            .iter()
            .flat_map(|maps| maps.items.iter())
            .filter(|(_, value)| !value.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect())
    }

    fn all(&self) -> Result<HashMap<Key, Arc<Value>>> {
        let now = Instant::now();

        Ok(self
            .read_all()
            .iter()
            .flat_map(|maps| maps.items.iter())
            .filter(|(_, value)| !value.is_expired(now))
            .map(|(key, value)| (key.clone(), Arc::clone(value)))
            .collect())
    }

    fn all_with_ttl(&self) -> Result<HashMap<Key, Arc<Value>>> {
        Ok(self
            .read_all()
            .iter()
            .flat_map(|maps| maps.items_with_ttl.iter())
            .map(|(key, value)| (key.clone(), Arc::clone(value)))
            .collect())
    }

    fn purge_expired(&self, key: &Key, now: Instant) -> Result<bool> {
        let mut maps = self.get_shard(key).write();

        let expired = maps
            .items
            .get(key)
            .map(|value| value.is_expired(now))
            .unwrap_or(false);

        if expired {
            maps.remove(key);
            self.purged_count.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Purged expired entry");
        }

        Ok(expired)
    }
}
