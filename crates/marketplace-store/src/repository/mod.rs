//! # Repository Module
//!
//! SQLite repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartStore writer task                                                 │
//! │       │                                                                 │
//! │       │  kv.set("@GoMarketplace:products", "[...]")                    │
//! │       ▼                                                                 │
//! │  KvRepository (impl KeyValueStore)                                     │
//! │  ├── get(&self, key)                                                   │
//! │  ├── set(&self, key, value)      ← upsert                              │
//! │  ├── remove(&self, key)                                                │
//! │  └── updated_at(&self, key)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite kv_store table                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`KvRepository`](kv::KvRepository) - String key-value rows

pub mod kv;
