//! # Domain Types
//!
//! The two shapes a cart entry takes.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐                 ┌─────────────────┐               │
//! │  │    Product      │  add_to_cart()  │    LineItem     │               │
//! │  │  ─────────────  │ ──────────────► │  ─────────────  │               │
//! │  │  id             │                 │  id             │               │
//! │  │  title          │                 │  title          │               │
//! │  │  image_url      │                 │  image_url      │               │
//! │  │  price          │                 │  price          │               │
//! │  │                 │                 │  quantity (>=1) │               │
//! │  └─────────────────┘                 └─────────────────┘               │
//! │                                                                         │
//! │  Product comes from the catalog; LineItem is what the cart stores and  │
//! │  what gets persisted.                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Names
//! Field names are serialized verbatim (`image_url`, not `imageUrl`): the
//! persisted snapshot and the storefront UI both use snake_case keys.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Product
// =============================================================================

/// A catalog product as handed to the cart by the UI.
///
/// Carries no quantity: the cart decides that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    /// Opaque identifier, unique within the cart by convention.
    pub id: String,

    /// Display name.
    pub title: String,

    /// Reference to the product image.
    pub image_url: String,

    /// Unit price. Currency and precision belong to the caller.
    pub price: f64,
}

impl Product {
    /// Creates a product descriptor.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        Product {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// One product entry in the cart.
///
/// ## Invariant
/// A `LineItem` held by a [`Cart`](crate::Cart) always has `quantity >= 1`.
/// Reaching zero removes the entry instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,

    /// Units of this product in the cart.
    pub quantity: u32,
}

impl LineItem {
    /// Creates a line item for a freshly added product (quantity 1).
    pub fn from_product(product: Product) -> Self {
        LineItem {
            id: product.id,
            title: product.title,
            image_url: product.image_url,
            price: product.price,
            quantity: 1,
        }
    }

    /// Unit price multiplied by quantity.
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

impl From<Product> for LineItem {
    fn from(product: Product) -> Self {
        LineItem::from_product(product)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
