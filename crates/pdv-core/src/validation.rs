//! # Validation Module
//!
//! Input validation for records before they reach a collection.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Operator console / web UI                                    │
//! │  ├── Parsing (numbers, prices, payment method names)                   │
//! │  └── Immediate feedback                                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field rules (required, length, range, format)                     │
//! │  └── Shared by upsert, restore, and checkout                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Inventory / cart rules                                       │
//! │  └── Stock, uniqueness, EAN-13 check digits                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use pdv_core::validation::{validate_product_name, validate_price_cents};
//!
//! assert!(validate_product_name("Arroz 5kg").is_ok());
//! assert!(validate_price_cents(-1).is_err());
//! ```

use crate::error::ValidationError;
use crate::{MAX_NAME_LEN, MAX_NOTE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most `MAX_NAME_LEN` characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_required_text("name", name, MAX_NAME_LEN)
}

/// Validates a customer name. Same rules as product names.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_required_text("customer name", name, MAX_NAME_LEN)
}

/// Validates a product group name.
pub fn validate_group_name(name: &str) -> ValidationResult<()> {
    validate_required_text("group", name, MAX_NAME_LEN)
}

/// Validates the cashier name recorded on a sale.
pub fn validate_cashier_name(name: &str) -> ValidationResult<()> {
    validate_required_text("cashier", name, MAX_NAME_LEN)
}

/// Validates a free-text sale note. Empty notes are allowed.
pub fn validate_note(note: &str) -> ValidationResult<()> {
    if note.chars().count() > MAX_NOTE_LEN {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: MAX_NOTE_LEN,
        });
    }
    Ok(())
}

/// Validates a CPF (11 digits) or CNPJ (14 digits) and returns its digits.
///
/// Punctuation (`.`, `-`, `/`, spaces) is stripped first; check digits are
/// not verified.
///
/// ## Example
/// ```rust
/// use pdv_core::validation::normalize_document;
///
/// assert_eq!(normalize_document("123.456.789-09").unwrap(), "12345678909");
/// assert!(normalize_document("12.345").is_err());
/// ```
pub fn normalize_document(document: &str) -> ValidationResult<String> {
    let trimmed = document.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "document".to_string(),
        });
    }

    let mut digits = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '.' | '-' | '/' | ' ' => {}
            _ => {
                return Err(ValidationError::InvalidFormat {
                    field: "document".to_string(),
                    reason: format!("unexpected character '{}'", c),
                })
            }
        }
    }

    match digits.len() {
        11 | 14 => Ok(digits),
        n => Err(ValidationError::InvalidFormat {
            field: "document".to_string(),
            reason: format!("expected 11 (CPF) or 14 (CNPJ) digits, got {}", n),
        }),
    }
}

/// Loose e-mail shape check: one `@` with text on both sides and a dot in
/// the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        })
    }
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (returns all/default results)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a price in cents.
///
/// ## Rules
/// - Must be non-negative (>= 0)
/// - Zero is allowed (free items)
///
/// ## Example
/// ```rust
/// use pdv_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());  // 10.99
/// assert!(validate_price_cents(0).is_ok());     // Free item
/// assert!(validate_price_cents(-100).is_err()); // Invalid
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level. Stock is never negative.
pub fn validate_stock_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
