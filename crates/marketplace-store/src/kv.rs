//! # Key-Value Store Contract
//!
//! The asynchronous get / set / remove interface the cart persists through,
//! plus an in-memory implementation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    KeyValueStore implementations                        │
//! │                                                                         │
//! │              Arc<dyn KeyValueStore>                                     │
//! │                       │                                                 │
//! │          ┌────────────┴─────────────┐                                   │
//! │          ▼                          ▼                                   │
//! │  ┌──────────────────┐      ┌──────────────────┐                        │
//! │  │   MemoryStore    │      │   KvRepository   │                        │
//! │  │  RwLock<HashMap> │      │  kv_store table  │                        │
//! │  │  (tests, demos)  │      │  (SQLite, WAL)   │                        │
//! │  └──────────────────┘      └──────────────────┘                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::fmt::Debug;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreResult;

/// A string-keyed asynchronous key-value store.
///
/// Methods take `&self`; implementations use interior mutability so one
/// store can be shared behind an `Arc`.
#[async_trait]
pub trait KeyValueStore: Send + Sync + Debug {
    /// Reads the value at `key`. `Ok(None)` if the key was never written.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Inserts or replaces the value at `key`.
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Removes `key`. Succeeds whether or not the key existed.
    async fn remove(&self, key: &str) -> StoreResult<()>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `value` at `key`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        MemoryStore {
            entries: RwLock::new(entries),
        }
    }

    /// Number of stored keys.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
