//! # Cart Error Types
//!
//! Errors surfaced to code that holds a cart.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Error Categories                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Composition   │  │   Persistence   │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  NotProvided    │  │  Persistence    │  │  InvalidConfig          │ │
//! │  │                 │  │  Load           │  │  ConfigLoadFailed       │ │
//! │  │                 │  │  WriterClosed   │  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  None of these ever roll back the in-memory cart.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

use marketplace_core::CoreError;
use marketplace_store::StoreError;

/// Result type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// A write of the cart snapshot that did not reach storage.
///
/// Returned from the mutation that requested the write and broadcast to
/// every [`CartStore::failures`](crate::CartStore::failures) subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceFailure {
    /// Storage key the write targeted.
    pub key: String,

    /// Store error, rendered.
    pub message: String,

    pub occurred_at: DateTime<Utc>,
}

impl PersistenceFailure {
    pub fn new(key: impl Into<String>, message: impl Into<String>) -> Self {
        PersistenceFailure {
            key: key.into(),
            message: message.into(),
            occurred_at: Utc::now(),
        }
    }
}

impl std::fmt::Display for PersistenceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "writing '{}' failed: {}", self.key, self.message)
    }
}

/// Cart error type.
#[derive(Debug, Error)]
pub enum CartError {
    // =========================================================================
    // Composition Errors
    // =========================================================================
    /// A cart was requested from a provider that holds none.
    #[error("use_cart must be used within a CartProvider")]
    NotProvided,

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// The snapshot write failed. The in-memory cart already reflects the
    /// mutation.
    #[error("Cart not saved: {0}")]
    Persistence(PersistenceFailure),

    /// Reading the persisted snapshot failed.
    #[error("Cart load failed: {0}")]
    Load(#[from] StoreError),

    /// The persistence writer is gone (runtime shut down).
    #[error("Cart persistence writer is closed")]
    WriterClosed,

    // =========================================================================
    // Domain Errors
    // =========================================================================
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid cart configuration.
    #[error("Invalid cart configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl From<std::io::Error> for CartError {
    fn from(err: std::io::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for CartError {
    fn from(err: toml::de::Error) -> Self {
        CartError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for CartError {
    fn from(err: toml::ser::Error) -> Self {
        CartError::ConfigSaveFailed(err.to_string())
    }
}

impl CartError {
    /// Returns true if the cart was used without being composed correctly.
    /// Retrying never helps; the calling code must be fixed.
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            CartError::NotProvided
                | CartError::InvalidConfig(_)
                | CartError::ConfigLoadFailed(_)
                | CartError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if only durability was lost: the cart in memory is
    /// still correct.
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            CartError::Persistence(_) | CartError::Load(_) | CartError::WriterClosed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_provided_message() {
        assert_eq!(
            CartError::NotProvided.to_string(),
            "use_cart must be used within a CartProvider"
        );
        assert!(CartError::NotProvided.is_configuration_error());
    }

    #[test]
    fn test_persistence_display() {
        let err = CartError::Persistence(PersistenceFailure::new("k", "disk full"));
        assert_eq!(err.to_string(), "Cart not saved: writing 'k' failed: disk full");
        assert!(err.is_persistence_error());
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_store_error_converts_to_load() {
        let err: CartError = StoreError::PoolExhausted.into();
        assert!(matches!(err, CartError::Load(_)));
    }
}
