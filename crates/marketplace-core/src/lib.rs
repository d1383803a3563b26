//! # marketplace-core: Pure Cart Rules for GoMarketplace
//!
//! This crate holds the cart's data model and the three cart mutations as
//! pure functions over an in-memory sequence. Nothing here touches storage.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     GoMarketplace Cart Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     Storefront UI (mobile)                      │   │
//! │  │     Product list ──► Cart screen ──► +/- buttons                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Arc<CartStore>                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 marketplace-cart (CartStore)                    │   │
//! │  │     add_to_cart, increment, decrement, subscribe               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            ★ marketplace-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   cart    │  │ validation│                  │   │
//! │  │   │  Product  │  │   Cart    │  │  snapshot │                  │   │
//! │  │   │ LineItem  │  │  Totals   │  │   checks  │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORAGE • PURE FUNCTIONS                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              marketplace-store (key-value persistence)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - `Product` and `LineItem`
//! - [`cart`] - `Cart` with add / increment / decrement, snapshot codec
//! - [`error`] - Domain error types
//! - [`validation`] - Checks applied to snapshots read back from storage
//!
//! ## Example Usage
//!
//! ```rust
//! use marketplace_core::{Cart, Product};
//!
//! let mut cart = Cart::new();
//! cart.add(Product::new("p1", "Shirt", "u", 10.0));
//! cart.increment("p1");
//!
//! assert_eq!(cart.items()[0].quantity, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartOp, CartTotals, Mutation};
pub use error::{CoreError, CoreResult, ValidationError};
pub use types::{LineItem, Product};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Key under which the serialized cart snapshot is stored.
///
/// Existing installs already hold data under this exact key, so it must
/// never change.
pub const STORAGE_KEY: &str = "@GoMarketplace:products";
