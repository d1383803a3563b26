//! # marketplace-store: Key-Value Persistence for GoMarketplace
//!
//! The cart persists one JSON snapshot under one key. This crate provides
//! the store contract and its backends.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart Persistence Flow                            │
//! │                                                                         │
//! │  CartStore writer task                                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 marketplace-store (THIS CRATE)                  │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ KeyValueStore │    │  Database     │    │  Migrations  │  │   │
//! │  │   │   (kv.rs)     │    │  (pool.rs)    │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ MemoryStore   │    │ SqlitePool    │    │ 001_kv_store │  │   │
//! │  │   │ KvRepository ◄┼────│               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  marketplace.db (platform data directory)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketplace_store::{Database, DbConfig, KeyValueStore};
//!
//! let db = Database::new(DbConfig::new("path/to/marketplace.db")).await?;
//! let kv: Arc<dyn KeyValueStore> = Arc::new(db.kv());
//! ```

pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use kv::{KeyValueStore, MemoryStore};
pub use pool::{Database, DbConfig};
pub use repository::kv::KvRepository;
