//! # Error Types
//!
//! Domain-specific error types for marketplace-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  marketplace-core errors (this file)                                   │
//! │  ├── CoreError        - Snapshot decoding / rule violations            │
//! │  └── ValidationError  - A single field failed a check                  │
//! │                                                                         │
//! │  marketplace-store errors (separate crate)                             │
//! │  └── StoreError       - Key-value store failures                       │
//! │                                                                         │
//! │  marketplace-cart errors                                               │
//! │  └── CartError        - What CartStore callers see                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CartError → UI                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core cart errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The persisted snapshot could not be decoded.
    ///
    /// ## When This Occurs
    /// - Storage holds something that is not a JSON array of line items
    /// - A line item lacks a field or has a negative quantity
    #[error("Corrupt cart snapshot: {0}")]
    CorruptSnapshot(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::CorruptSnapshot(err.to_string())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., NaN price).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
