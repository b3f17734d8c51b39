//! # ttlkv - An In-Memory Key-Value Storage Engine
//!
//! ttlkv is the storage layer of a Redis-style key-value database: a
//! mapping from binary keys to typed values (string, list, hash, set) that
//! may carry an expiration deadline.
//!
//! ## Features
//!
//! - **Atomic Updates**: Every write is a read-modify-write driven by a caller-supplied closure
//! - **Lazy Expiry**: Expired entries read as absent without being removed on access
//! - **TTL Index**: Entries carrying a TTL are indexed separately for cheap sweeping
//! - **Sharded Locks**: Keys are spread across independently locked shards
//! - **Active Expiry**: An optional Tokio task purges expired entries in the background
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                ttlkv                                    │
//! │                                                                         │
//! │   Command dispatcher (caller)                                           │
//! │            │                                                            │
//! │            ▼                                                            │
//! │  ┌──────────────────────────────────────────────────────────────────┐   │
//! │  │                   MemoryStorage (impl Storage)                   │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────┐         │   │
//! │  │  │ Shard 0   │ │ Shard 1   │ │ Shard 2   │ │ ...N      │         │   │
//! │  │  │ items     │ │ items     │ │ items     │ │ shards    │         │   │
//! │  │  │ with_ttl  │ │ with_ttl  │ │ with_ttl  │ │           │         │   │
//! │  │  └───────────┘ └───────────┘ └───────────┘ └───────────┘         │   │
//! │  └──────────────────────────────────────────────────────────────────┘   │
//! │                                ▲                                        │
//! │                                │ all_with_ttl / purge_expired           │
//! │            ┌───────────────────┴──────────────────────┐                 │
//! │            │             ExpirySweeper                │                 │
//! │            │        (Background Tokio Task)           │                 │
//! │            └──────────────────────────────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use ttlkv::{start_expiry_sweeper, Key, MemoryStorage, Storage, StorageError, Value};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let storage = Arc::new(MemoryStorage::new());
//!
//!     // Purge expired entries in the background
//!     let _sweeper = start_expiry_sweeper(Arc::clone(&storage));
//!
//!     storage
//!         .put(Key::from("session"), |_| {
//!             Ok::<_, StorageError>(Some(Value::string("token").with_ttl(Duration::from_secs(30))))
//!         })
//!         .unwrap();
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: The `Storage` trait, key/value types, the in-memory engine and the sweeper
//!
//! ## Design Highlights
//!
//! ### Compare-And-Set Writes
//!
//! `Storage::put` is the only write path. The closure sees the current
//! value (or `None` when absent or expired) and decides what to store,
//! all while the key's shard is write-locked. Concurrent updates to the
//! same key therefore never lose each other's writes.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: Reads check the deadline and treat expired entries as missing
//! 2. **Active**: A background task walks the TTL index and purges them
//!
//! The TTL index keeps the active pass proportional to the number of
//! expiring keys rather than the whole keyspace.

pub mod storage;

// Re-export commonly used types for convenience
pub use storage::{
    start_expiry_sweeper, ExpiryConfig, ExpirySweeper, Key, MemoryStorage, Payload, Storage,
    StorageConfig, StorageError, Value, ValueKind,
};

/// Version of ttlkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
