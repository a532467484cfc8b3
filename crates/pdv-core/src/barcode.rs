//! # Barcode Module
//!
//! EAN-13 validation and generation.
//!
//! ## Check Digit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  position   0 1 2 3 4 5 6 7 8 9 10 11 │ 12                             │
//! │  weight     1 3 1 3 1 3 1 3 1 3  1  3 │ check                          │
//! │                                                                         │
//! │  sum   = Σ digit[i] × weight[i]                                         │
//! │  check = (10 − sum mod 10) mod 10                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Generated codes use the Brazilian GS1 prefix `789` followed by nine random
//! digits, so they never collide with the check-digit rules of real labels.
//!
//! ## Usage
//! ```rust
//! use pdv_core::barcode;
//!
//! assert!(barcode::validate("7891234567895"));
//! assert!(barcode::validate(&barcode::generate()));
//! ```

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Number of digits in an EAN-13 code.
pub const EAN13_LEN: usize = 13;

/// Prefix used for generated in-store codes.
pub const DEFAULT_PREFIX: &str = "789";

// =============================================================================
// Validation
// =============================================================================

/// Computes the check digit for the first twelve digits of a code.
///
/// Returns `None` when `digits` is not exactly twelve ASCII digits.
pub fn check_digit(digits: &str) -> Option<u8> {
    if digits.len() != EAN13_LEN - 1 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let sum: u32 = digits
        .bytes()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 0 {
                digit
            } else {
                digit * 3
            }
        })
        .sum();

    Some(((10 - sum % 10) % 10) as u8)
}

/// Returns true iff `code` is exactly 13 ASCII digits with a matching check digit.
pub fn validate(code: &str) -> bool {
    if code.len() != EAN13_LEN || !code.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let (body, last) = code.split_at(EAN13_LEN - 1);
    match check_digit(body) {
        Some(expected) => last.as_bytes()[0] - b'0' == expected,
        None => false,
    }
}

// =============================================================================
// Generation
// =============================================================================

/// Generates a valid code with the `789` prefix.
pub fn generate() -> String {
    generate_with_rng(DEFAULT_PREFIX, &mut rand::thread_rng())
}

/// Generates a valid code starting with `prefix`.
///
/// Fails with [`CoreError::InvalidBarcode`] when the prefix is longer than
/// twelve digits or contains anything but ASCII digits.
pub fn generate_with_prefix(prefix: &str) -> CoreResult<String> {
    if prefix.len() > EAN13_LEN - 1 {
        return Err(CoreError::invalid_barcode(prefix, "prefix longer than 12 digits"));
    }
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CoreError::invalid_barcode(prefix, "prefix must contain only digits"));
    }

    Ok(generate_with_rng(prefix, &mut rand::thread_rng()))
}

/// Fills `prefix` with random digits up to twelve and appends the check digit.
///
/// Callers guarantee `prefix` is at most twelve ASCII digits.
pub fn generate_with_rng<R: Rng + ?Sized>(prefix: &str, rng: &mut R) -> String {
    let mut code = String::with_capacity(EAN13_LEN);
    code.push_str(prefix);
    while code.len() < EAN13_LEN - 1 {
        let digit: u8 = rng.gen_range(0..10);
        code.push(char::from(b'0' + digit));
    }

    let check = check_digit(&code).unwrap_or(0);
    code.push(char::from(b'0' + check));
    code
}

// =============================================================================
// Barcode Newtype
// =============================================================================

/// A code that has passed EAN-13 validation.
///
/// Every scanned or typed code goes through [`Barcode::parse`] before it
/// reaches the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Barcode(String);

impl Barcode {
    /// Trims surrounding whitespace and validates the code.
    pub fn parse(raw: &str) -> CoreResult<Self> {
        let code = raw.trim();
        if code.len() != EAN13_LEN {
            return Err(CoreError::invalid_barcode(code, "must have exactly 13 digits"));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::invalid_barcode(code, "must contain only digits"));
        }
        if !validate(code) {
            return Err(CoreError::invalid_barcode(code, "check digit mismatch"));
        }
        Ok(Barcode(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Barcode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Barcode {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Barcode::parse(&value)
    }
}

impl From<Barcode> for String {
    fn from(barcode: Barcode) -> Self {
        barcode.0
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_known_codes() {
        assert!(validate("7891234567895"));
        assert!(validate("4006381333931"));
        assert!(validate("0000000000000"));
    }

    #[test]
    fn test_rejects_bad_shape() {
        assert!(!validate(""));
        assert!(!validate("789123456789"));
        assert!(!validate("78912345678950"));
        assert!(!validate("78912345678a5"));
        assert!(!validate(" 7891234567895"));
        // Non-ASCII digits never count as digits
        assert!(!validate("789123456789٥"));
    }

    #[test]
    fn test_rejects_wrong_check_digit() {
        assert!(!validate("7891234567890"));
        assert!(!validate("7891234567896"));
    }

    #[test]
    fn test_check_digit() {
        assert_eq!(check_digit("789123456789"), Some(5));
        assert_eq!(check_digit("400638133393"), Some(1));
        assert_eq!(check_digit("78912345678"), None);
        assert_eq!(check_digit("78912345678x"), None);
    }

    #[test]
    fn test_generate_uses_prefix() {
        let code = generate();
        assert_eq!(code.len(), EAN13_LEN);
        assert!(code.starts_with(DEFAULT_PREFIX));
        assert!(validate(&code));
    }

    #[test]
    fn test_generate_with_prefix() {
        let code = generate_with_prefix("7890000000").unwrap();
        assert!(code.starts_with("7890000000"));
        assert!(validate(&code));

        // Mutating the check digit invalidates it
        let last = code.as_bytes()[12] - b'0';
        let mutated = format!("{}{}", &code[..12], (last + 1) % 10);
        assert!(!validate(&mutated));
    }

    #[test]
    fn test_generate_with_full_prefix() {
        let code = generate_with_prefix("789123456789").unwrap();
        assert_eq!(code, "7891234567895");
    }

    #[test]
    fn test_generate_with_bad_prefix() {
        let err = generate_with_prefix("7891234567890").unwrap_err();
        assert!(matches!(err, CoreError::InvalidBarcode { .. }));

        let err = generate_with_prefix("78a").unwrap_err();
        assert!(matches!(err, CoreError::InvalidBarcode { .. }));
    }

    #[test]
    fn test_generate_is_deterministic_with_seed() {
        let a = generate_with_rng("789", &mut StdRng::seed_from_u64(7));
        let b = generate_with_rng("789", &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_trims() {
        let barcode = Barcode::parse("  7891234567895\n").unwrap();
        assert_eq!(barcode.as_str(), "7891234567895");
    }

    #[test]
    fn test_parse_reports_reason() {
        let err = Barcode::parse("123").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid barcode '123': must have exactly 13 digits"
        );

        let err = Barcode::parse("7891234567890").unwrap_err();
        assert!(err.to_string().contains("check digit mismatch"));
    }

    #[test]
    fn test_barcode_serde_validates() {
        let ok: Barcode = serde_json::from_str("\"7891234567895\"").unwrap();
        assert_eq!(ok.to_string(), "7891234567895");
        assert!(serde_json::from_str::<Barcode>("\"7891234567890\"").is_err());
    }

    proptest! {
        #[test]
        fn prop_generated_codes_validate(seed in any::<u64>()) {
            let code = generate_with_rng(DEFAULT_PREFIX, &mut StdRng::seed_from_u64(seed));
            prop_assert!(validate(&code));
        }

        #[test]
        fn prop_any_prefix_generates_valid(prefix in "[0-9]{0,12}") {
            let code = generate_with_prefix(&prefix).unwrap();
            prop_assert!(code.starts_with(&prefix));
            prop_assert!(validate(&code));
        }

        #[test]
        fn prop_single_digit_change_fails(seed in any::<u64>(), pos in 0usize..13, delta in 1u8..10) {
            let code = generate_with_rng(DEFAULT_PREFIX, &mut StdRng::seed_from_u64(seed));
            let mut bytes = code.into_bytes();
            bytes[pos] = b'0' + (bytes[pos] - b'0' + delta) % 10;
            let mutated = String::from_utf8(bytes).unwrap();
            prop_assert!(!validate(&mutated));
        }

        #[test]
        fn prop_wrong_length_never_validates(code in "[0-9]{0,12}|[0-9]{14,20}") {
            prop_assert!(!validate(&code));
        }
    }
}
