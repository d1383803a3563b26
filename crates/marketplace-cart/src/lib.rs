//! # marketplace-cart: Persisted Cart State Container
//!
//! The cart the storefront UI reads from and mutates. Every change is
//! visible immediately and written through to a [`KeyValueStore`] in the
//! background.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         marketplace-cart                                │
//! │                                                                         │
//! │   UI / screens                                                          │
//! │        │  provider.use_cart()?                                          │
//! │        ▼                                                                │
//! │  ┌───────────────┐   Job queue (FIFO)   ┌─────────────────────────┐    │
//! │  │  CartStore    │ ───────────────────► │  PersistenceWriter      │    │
//! │  │               │                      │  (one tokio task)       │    │
//! │  │  products()   │ ◄── hydrate once ─── │                         │    │
//! │  │  add_to_cart  │                      │  kv.get / kv.set        │    │
//! │  │  increment    │                      └────────────┬────────────┘    │
//! │  │  decrement    │                                   │                  │
//! │  └───────┬───────┘                                   ▼                  │
//! │          │ watch                         ┌─────────────────────────┐    │
//! │          ▼                               │  KeyValueStore          │    │
//! │     subscribers                          │  MemoryStore / SQLite   │    │
//! │                                          └─────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`store`]: `CartStore` and the `PendingWrite` each mutation returns
//! - [`writer`]: hydration and write-through task
//! - [`provider`]: `CartProvider` slot handing the store to consumers
//! - [`config`]: TOML + environment configuration
//! - [`error`]: `CartError` and `PersistenceFailure`
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use marketplace_cart::{CartProvider, CartStore, Product};
//! use marketplace_store::{KeyValueStore, MemoryStore};
//!
//! # async fn run() -> marketplace_cart::CartResult<()> {
//! let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
//! let provider = CartProvider::with_store(CartStore::open_default(kv).await);
//!
//! let cart = provider.use_cart()?;
//! cart.add_to_cart(Product::new("1", "Canvas Tote Bag", "https://img/1.png", 24.9))
//!     .await?;
//! cart.increment("1").await?;
//! assert_eq!(cart.products()[0].quantity, 2);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod store;
pub mod writer;

pub use config::CartConfig;
pub use error::{CartError, CartResult, PersistenceFailure};
pub use provider::CartProvider;
pub use store::{CartStore, PendingWrite};
pub use writer::Hydration;

pub use marketplace_core::{CartTotals, LineItem, Product, STORAGE_KEY};
pub use marketplace_store::KeyValueStore;
