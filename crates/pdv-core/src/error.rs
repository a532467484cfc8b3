//! # Error Types
//!
//! Domain-specific error types for pdv-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  pdv-core errors (this file)                                           │
//! │  ├── CoreError        - Business outcomes (stock, cart, checkout)      │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── StoreError       - Persistence collaborator failures              │
//! │                                                                         │
//! │  pdv-db errors (separate crate)                                        │
//! │  └── DbError          - SQLite failures, mapped into StoreError        │
//! │                                                                         │
//! │  terminal errors (in app)                                              │
//! │  └── CommandError     - What the operator sees                         │
//! │                                                                         │
//! │  Flow: DbError → StoreError → CoreError → CommandError → Operator      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (barcode, ID, quantities)
//! 3. Expected business conditions are variants, never panics
//! 4. Every variant maps to a machine-readable [`ErrorKind`]

use serde::Serialize;
use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// The cart engine and the sale committer return these for every expected
/// business condition. Only [`CoreError::Storage`] signals an unexpected
/// failure.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Quantity is not a positive integer.
    #[error("Invalid quantity {quantity}: must be at least 1")]
    InvalidQuantity { quantity: i64 },

    /// Product has no stock at all.
    #[error("{name} ({barcode}) is out of stock")]
    OutOfStock { barcode: String, name: String },

    /// Requested quantity exceeds the available stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Scan COCA-COLA (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "7891234567895", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// Operator sees: "Only 3 in stock"
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// Discount percentage outside [0, 100] or not a number.
    #[error("Invalid discount {percent}%: must be between 0 and 100")]
    InvalidDiscount { percent: f64 },

    /// Checkout attempted with no lines in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout total is zero or negative.
    #[error("Sale total must be positive, got {total}")]
    ZeroOrNegativeTotal { total: Money },

    /// Customer id does not resolve.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Product id/barcode does not resolve.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The barcode has no line in the cart.
    #[error("Barcode {0} is not in the cart")]
    NotInCart(String),

    /// Code is not a valid EAN-13 barcode.
    #[error("Invalid barcode '{code}': {reason}")]
    InvalidBarcode { code: String, reason: String },

    /// Backup document rejected before any write.
    #[error("Invalid backup format: {reason}")]
    InvalidBackupFormat { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Persistence collaborator failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidBarcode`].
    pub fn invalid_barcode(code: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidBarcode {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for [`CoreError::InvalidBackupFormat`].
    pub fn invalid_backup(reason: impl Into<String>) -> Self {
        CoreError::InvalidBackupFormat {
            reason: reason.into(),
        }
    }

    /// Returns the machine-readable failure kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InvalidQuantity { .. } => ErrorKind::InvalidQuantity,
            CoreError::OutOfStock { .. } => ErrorKind::OutOfStock,
            CoreError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            CoreError::InvalidDiscount { .. } => ErrorKind::InvalidDiscount,
            CoreError::EmptyCart => ErrorKind::EmptyCart,
            CoreError::ZeroOrNegativeTotal { .. } => ErrorKind::ZeroOrNegativeTotal,
            CoreError::CustomerNotFound(_) => ErrorKind::CustomerNotFound,
            CoreError::ProductNotFound(_) => ErrorKind::ProductNotFound,
            CoreError::NotInCart(_) => ErrorKind::NotInCart,
            CoreError::InvalidBarcode { .. } => ErrorKind::InvalidBarcode,
            CoreError::InvalidBackupFormat { .. } => ErrorKind::InvalidBackupFormat,
            CoreError::Validation(_) => ErrorKind::Validation,
            CoreError::Storage(_) => ErrorKind::StorageError,
        }
    }

    /// Storage failures may succeed on retry; business rejections will not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Storage(_))
    }
}

/// Discriminant of [`CoreError`], serialized for UI consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidQuantity,
    OutOfStock,
    InsufficientStock,
    InvalidDiscount,
    EmptyCart,
    ZeroOrNegativeTotal,
    CustomerNotFound,
    ProductNotFound,
    NotInCart,
    InvalidBarcode,
    InvalidBackupFormat,
    Validation,
    StorageError,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation of records before they reach a collection.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., bad document, unknown payment method).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate barcode).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Store Error
// =============================================================================

/// Failures of the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend cannot be reached (closed pool, missing file, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A collection holds records that do not decode.
    #[error("collection '{collection}' is corrupt: {reason}")]
    Corrupt { collection: String, reason: String },

    /// Any other backend failure (query, transaction, disk).
    #[error("store backend failure: {0}")]
    Backend(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for persistence operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            barcode: "7891234567895".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 7891234567895: available 3, requested 5"
        );

        let err = CoreError::ZeroOrNegativeTotal {
            total: Money::zero(),
        };
        assert_eq!(err.to_string(), "Sale total must be positive, got 0.00");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "name".to_string(),
        };
        assert_eq!(err.to_string(), "name is required");

        let err = ValidationError::Duplicate {
            field: "barcode".to_string(),
            value: "7891234567895".to_string(),
        };
        assert_eq!(err.to_string(), "barcode '7891234567895' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_only_storage_is_retryable() {
        let storage: CoreError = StoreError::Backend("disk full".to_string()).into();
        assert!(storage.is_retryable());
        assert_eq!(storage.kind(), ErrorKind::StorageError);

        assert!(!CoreError::EmptyCart.is_retryable());
        assert!(!CoreError::ProductNotFound("x".into()).is_retryable());
    }

    #[test]
    fn test_kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorKind::ZeroOrNegativeTotal).unwrap();
        assert_eq!(json, "\"ZERO_OR_NEGATIVE_TOTAL\"");
    }
}
