//! # Validation Module
//!
//! Checks applied to products entering the cart and to line items read
//! back from storage. Both paths accept exactly the same values, so
//! anything the cart can hold survives a reload.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  ├── Shape: JSON array of objects                                       │
//! │  └── Types: quantity is an unsigned integer                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── quantity >= 1                  (load only; mutations keep it)      │
//! │  └── price is a finite number       (add and load)                      │
//! │                                                                         │
//! │  `id` is opaque: any string, the empty one included, is accepted.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Price range is deliberately unchecked: no price validation is done on
//! the cart side.

use crate::error::ValidationError;
use crate::types::{LineItem, Product};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a single line item.
///
/// ## Example
/// ```rust
/// use marketplace_core::{LineItem, Product};
/// use marketplace_core::validation::validate_line_item;
///
/// let item = LineItem::from(Product::new("p1", "Shirt", "u", 10.0));
/// assert!(validate_line_item(&item).is_ok());
/// ```
pub fn validate_line_item(item: &LineItem) -> ValidationResult<()> {
    validate_quantity(item.quantity)?;
    validate_price(item.price)
}

/// Validates a product before it is added.
///
/// JSON has no encoding for NaN or infinity, so such a price could be held
/// in memory but never read back.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_price(product.price)
}

fn validate_price(price: f64) -> ValidationResult<()> {
    if !price.is_finite() {
        return Err(ValidationError::InvalidFormat {
            field: "price".to_string(),
            reason: format!("{} is not a finite number", price),
        });
    }
    Ok(())
}

/// Validates that a quantity may be held by the cart.
pub fn validate_quantity(quantity: u32) -> ValidationResult<()> {
    if quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates every item of a decoded snapshot, stopping at the first failure.
pub fn validate_snapshot(items: &[LineItem]) -> ValidationResult<()> {
    items.iter().try_for_each(validate_line_item)
}
