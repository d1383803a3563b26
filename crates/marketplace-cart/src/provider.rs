//! # Cart Provider
//!
//! A slot that hands out the application's single [`CartStore`].
//!
//! Screens that are built before the cart exists hold a `CartProvider`
//! clone and ask it for the store when they need it. Asking before a store
//! was provided is a composition bug and fails with
//! [`CartError::NotProvided`].
//!
//! ```text
//! app start ──► CartProvider::new() ──► clone into every screen
//!                      │
//!          CartStore::open(..).await
//!                      │
//!                      ▼
//!              provider.provide(store)
//!                      │
//!     screen ──► provider.use_cart()? ──► Arc<CartStore>
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{CartError, CartResult};
use crate::store::CartStore;

/// Shared slot holding at most one cart. Clones share the slot.
#[derive(Debug, Clone, Default)]
pub struct CartProvider {
    slot: Arc<RwLock<Option<Arc<CartStore>>>>,
}

impl CartProvider {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a provider already holding `store`.
    pub fn with_store(store: Arc<CartStore>) -> Self {
        CartProvider {
            slot: Arc::new(RwLock::new(Some(store))),
        }
    }

    /// Installs `store`, returning the one it replaced.
    pub fn provide(&self, store: Arc<CartStore>) -> Option<Arc<CartStore>> {
        self.slot
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(store)
    }

    /// Returns the provided cart.
    ///
    /// ## Errors
    /// [`CartError::NotProvided`] when no cart has been provided yet.
    pub fn use_cart(&self) -> CartResult<Arc<CartStore>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(CartError::NotProvided)
    }

    pub fn is_provided(&self) -> bool {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
