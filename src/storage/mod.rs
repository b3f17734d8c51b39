//! Storage Engine Module
//!
//! This module defines the [`Storage`] capability that the command layer
//! talks to, the [`Key`] and [`Value`] types it stores, and the in-memory
//! backend [`MemoryStorage`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   Storage (trait)                            │
//! │   put · get · del · keys · all · all_with_ttl · purge_expired│
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │
//!                 ┌──────────────┴──────────────┐
//!                 │        MemoryStorage        │
//!                 │   items + items_with_ttl    │
//!                 │   (sharded, RwLock each)    │
//!                 └──────────────▲──────────────┘
//!                                │ all_with_ttl / purge_expired
//!                  ┌─────────────┴─────────────┐
//!                  │      ExpirySweeper        │
//!                  │  (Background Tokio Task)  │
//!                  └───────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use ttlkv::storage::{Key, MemoryStorage, Storage, StorageError, Value};
//!
//! let storage = MemoryStorage::new();
//!
//! // Atomic read-modify-write: append to a list, creating it if needed
//! storage
//!     .put(Key::from("queue"), |current| {
//!         let mut list = current.cloned().unwrap_or_else(|| Value::list(Vec::<&str>::new()));
//!         if let ttlkv::storage::Payload::List(items) = list.payload_mut() {
//!             items.push_back("job-1".into());
//!         }
//!         Ok::<_, StorageError>(Some(list))
//!     })
//!     .unwrap();
//!
//! assert_eq!(storage.get(&Key::from("queue")).unwrap().as_list().map(|l| l.len()), Some(1));
//! ```

pub mod error;
pub mod expiry;
pub mod key;
pub mod memory;
pub mod value;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

// Re-export commonly used types
pub use error::{Result, StorageError};
pub use expiry::{start_expiry_sweeper, sweep_once, ExpiryConfig, ExpirySweeper, SweepReport};
pub use key::Key;
pub use memory::{MemoryStorage, StorageConfig, StorageStats, DEFAULT_SHARDS};
pub use value::{Payload, Value, ValueKind};

/// A key-value storage backend.
///
/// Every operation returns a `Result` even where the in-memory backend
/// cannot fail, so backends that do I/O fit the same interface.
pub trait Storage: Send + Sync {
    /// Atomically updates the entry at `key`.
    ///
    /// `update` receives the current value, or `None` when the key is absent
    /// or expired, and returns the value to store:
    ///
    /// - `Ok(Some(value))` stores `value`, indexing it if it carries a TTL
    /// - `Ok(None)` removes the key
    /// - `Err(e)` leaves storage untouched and `put` returns `e` as-is
    ///
    /// `E` is the caller's own error type; it needs no conversion from
    /// [`StorageError`].
    ///
    /// No other operation observes the entry between the read and the
    /// write. `update` must not block or call back into the storage.
    fn put<F, E>(&self, key: Key, update: F) -> Result<(), E>
    where
        F: FnOnce(Option<&Value>) -> Result<Option<Value>, E>;

    /// Returns the value at `key`.
    ///
    /// Fails with [`StorageError::KeyNotFound`] if the key is absent or expired.
    fn get(&self, key: &Key) -> Result<Arc<Value>>;

    /// Removes `key`. Removing a missing key is not an error.
    fn del(&self, key: &Key) -> Result<()>;

    /// Returns every non-expired key, in no particular order.
    fn keys(&self) -> Result<Vec<Key>>;

    /// Returns a snapshot of every non-expired entry.
    fn all(&self) -> Result<HashMap<Key, Arc<Value>>>;

    /// Returns a snapshot of every entry that carries a TTL, expired or not.
    fn all_with_ttl(&self) -> Result<HashMap<Key, Arc<Value>>>;

    /// Removes `key` only if its stored value is expired as of `now`.
    ///
    /// Returns `true` if an entry was removed.
    fn purge_expired(&self, key: &Key, now: Instant) -> Result<bool>;
}
