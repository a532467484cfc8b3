//! # Identifiers
//!
//! Entity ids and human-readable receipt numbers.
//!
//! ## Dual-Key Identity Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  id             UUID v4, immutable, used for references between records │
//! │  receipt_number YYYYMMDD-NNNNNN, printed on paper, sorted by day         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! UUIDs are generated locally so a terminal never needs a server round-trip
//! to create a product, customer or sale.

use chrono::NaiveDate;
use uuid::Uuid;

/// Returns a fresh UUID v4 string.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Formats a receipt number as `YYYYMMDD-NNNNNN`.
///
/// `sequence` is the ledger length plus one at commit time. Sequences beyond
/// six digits are printed in full.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use pdv_core::ids::receipt_number;
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
/// assert_eq!(receipt_number(date, 42), "20240307-000042");
/// ```
pub fn receipt_number(date: NaiveDate, sequence: usize) -> String {
    format!("{}-{:06}", date.format("%Y%m%d"), sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_id_is_uuid_v4() {
        let id = new_id();
        let parsed = Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn test_new_ids_are_unique() {
        let ids: HashSet<String> = (0..1000).map(|_| new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_receipt_number_format() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        assert_eq!(receipt_number(date, 1), "20241231-000001");
        assert_eq!(receipt_number(date, 1_234_567), "20241231-1234567");
    }
}
