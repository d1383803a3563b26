//! # Cart
//!
//! The ordered sequence of line items and the three ways it changes.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action              Cart method            Sequence change          │
//! │  ─────────              ───────────            ───────────────          │
//! │                                                                         │
//! │  Tap "add" ───────────► add(product) ────────► push(item, qty = 1)     │
//! │                                                                         │
//! │  Tap "+" ─────────────► increment(id) ───────► items[i].qty += 1       │
//! │                                                                         │
//! │  Tap "-" ─────────────► decrement(id) ───────► qty == 1 ? remove(i)    │
//! │                                                 : items[i].qty -= 1     │
//! │                                                                         │
//! │  increment/decrement act on the FIRST entry with a matching id and     │
//! │  leave the sequence untouched when no entry matches.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Ids
//! `add` never merges: adding a product whose id is already present appends
//! a second entry with quantity 1, and increment/decrement only ever touch
//! the first of them. Decrementing a first entry at quantity 1 removes that
//! entry alone; later duplicates stay.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::types::{LineItem, Product};
use crate::validation::validate_snapshot;

/// Outcome of a cart operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The sequence changed.
    Changed,
    /// No entry matched; the sequence is as it was.
    Unchanged,
}

impl Mutation {
    #[inline]
    pub fn is_changed(self) -> bool {
        matches!(self, Mutation::Changed)
    }
}

/// One cart operation, kept so it can be applied again to another cart.
#[derive(Debug, Clone, PartialEq)]
pub enum CartOp {
    Add(Product),
    Increment(String),
    Decrement(String),
}

/// The shopping cart.
///
/// ## Invariants
/// - Every item has `quantity >= 1`
/// - Order is insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    /// Creates an empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Builds a cart from already-validated items.
    pub fn from_items(items: Vec<LineItem>) -> CoreResult<Self> {
        validate_snapshot(&items)?;
        Ok(Cart { items })
    }

    /// Decodes a persisted snapshot.
    ///
    /// An empty (or whitespace-only) value is an empty cart, matching a
    /// store that was never written.
    pub fn from_snapshot(raw: &str) -> CoreResult<Self> {
        if raw.trim().is_empty() {
            return Ok(Cart::new());
        }
        let items: Vec<LineItem> = serde_json::from_str(raw)?;
        Cart::from_items(items)
    }

    /// Encodes the full sequence for persistence.
    pub fn to_snapshot(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(&self.items)?)
    }

    /// Appends the product as a new entry with quantity 1.
    pub fn add(&mut self, product: Product) -> Mutation {
        self.items.push(LineItem::from_product(product));
        Mutation::Changed
    }

    /// Adds one unit to the first entry with this id.
    pub fn increment(&mut self, id: &str) -> Mutation {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                Mutation::Changed
            }
            None => Mutation::Unchanged,
        }
    }

    /// Removes one unit from the first entry with this id, dropping the
    /// entry when its last unit goes.
    pub fn decrement(&mut self, id: &str) -> Mutation {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return Mutation::Unchanged;
        };

        if self.items[index].quantity <= 1 {
            self.items.remove(index);
        } else {
            self.items[index].quantity -= 1;
        }
        Mutation::Changed
    }

    /// Applies `op` through the matching method.
    pub fn apply(&mut self, op: &CartOp) -> Mutation {
        match op {
            CartOp::Add(product) => self.add(product.clone()),
            CartOp::Increment(id) => self.increment(id),
            CartOp::Decrement(id) => self.decrement(id),
        }
    }

    /// Current items, in order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Consumes the cart, returning its items.
    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of entries (duplicates counted separately).
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Sum of `price * quantity` over all entries.
    pub fn subtotal(&self) -> f64 {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// Cart totals summary for the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    #[ts(type = "number")]
    pub total_quantity: u64,
    pub subtotal: f64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            subtotal: cart.subtotal(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
