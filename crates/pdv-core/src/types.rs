//! # Domain Types
//!
//! Core domain types used throughout the PDV.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartLine     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │──►│  product_id     │──►│  id (UUID)      │       │
//! │  │  barcode EAN-13 │   │  barcode (key)  │   │  receipt_number │       │
//! │  │  price_cents    │   │  unit_price     │   │  lines (frozen) │       │
//! │  │  stock_quantity │   │  quantity ≥ 1   │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ customer_id?   │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │  ProductGroup   │   │ PaymentMethod   │   │    Customer     │       │
//! │  │  id, name       │   │  Cash, Pix,     │   │  name, document │       │
//! │  └─────────────────┘   │  Credit, Debit  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `CartLine` freezes the product name and price at the first add. A sale
//! copies its lines, so later price edits never change historical records.
//!
//! All persisted records serialize with camelCase keys.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// EAN-13 barcode, unique across the catalog.
    pub barcode: String,

    /// Display name shown to the operator and on the receipt.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock_quantity: i64,

    /// Group label (see [`ProductGroup`]). Empty when ungrouped.
    #[serde(default)]
    pub group: String,

    /// Opaque image reference handed to the UI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn in_stock(&self) -> bool {
        self.stock_quantity > 0
    }

    /// Checks whether `quantity` units can be taken from stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.stock_quantity
    }
}

/// Caller-supplied product fields for [`crate::inventory::Inventory::upsert`].
///
/// `id: None` creates a new product. A blank barcode gets a generated one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    pub price_cents: i64,
    pub stock_quantity: i64,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl ProductInput {
    pub fn new(name: impl Into<String>, price_cents: i64, stock_quantity: i64) -> Self {
        Self {
            name: name.into(),
            price_cents,
            stock_quantity,
            ..Self::default()
        }
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<Product> for ProductInput {
    fn from(product: Product) -> Self {
        Self {
            id: Some(product.id),
            barcode: Some(product.barcode),
            name: product.name,
            price_cents: product.price_cents,
            stock_quantity: product.stock_quantity,
            group: product.group,
            image_ref: product.image_ref,
        }
    }
}

// =============================================================================
// Stock Policy
// =============================================================================

/// What `decrement_stock` does when asked for more than is on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum StockPolicy {
    /// Floor the stock at zero and log a warning.
    #[default]
    Clamp,
    /// Refuse with `InsufficientStock`; checkout validates up front.
    Reject,
}

impl StockPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockPolicy::Clamp => "clamp",
            StockPolicy::Reject => "reject",
        }
    }
}

impl FromStr for StockPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clamp" => Ok(StockPolicy::Clamp),
            "reject" => Ok(StockPolicy::Reject),
            _ => Err(ValidationError::NotAllowed {
                field: "stock_policy".to_string(),
                allowed: vec!["clamp".to_string(), "reject".to_string()],
            }),
        }
    }
}

// =============================================================================
// Cart Line
// =============================================================================

/// One line of the cart, keyed by barcode.
/// Uses snapshot pattern to freeze name and price at the first add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub barcode: String,
    /// Product name at time of add (frozen).
    pub name: String,
    /// Unit price in cents at time of add (frozen).
    pub unit_price_cents: i64,
    /// Always at least 1.
    pub quantity: i64,
    /// unit_price × quantity.
    pub line_subtotal_cents: i64,
}

fn line_subtotal(unit_price: Money, quantity: i64) -> Result<Money, ValidationError> {
    unit_price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "line_subtotal".to_string(),
            min: 0,
            max: i64::MAX,
        })
}

impl CartLine {
    /// Creates a line from the product's current name and price.
    ///
    /// Fails when price × quantity does not fit in an `i64` of cents.
    pub fn from_product(product: &Product, quantity: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            product_id: product.id.clone(),
            barcode: product.barcode.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            line_subtotal_cents: line_subtotal(product.price(), quantity)?.cents(),
        })
    }

    /// Overwrites the quantity and recomputes the subtotal.
    ///
    /// On overflow the line is left unchanged.
    pub fn set_quantity(&mut self, quantity: i64) -> Result<(), ValidationError> {
        self.line_subtotal_cents = line_subtotal(self.unit_price(), quantity)?.cents();
        self.quantity = quantity;
        Ok(())
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_subtotal(&self) -> Money {
        Money::from_cents(self.line_subtotal_cents)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Credit card on an external terminal.
    CreditCard,
    /// Debit card on an external terminal.
    DebitCard,
    /// Instant transfer via PIX key or QR code.
    Pix,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Pix,
    ];

    /// Label printed on receipts.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Dinheiro",
            PaymentMethod::CreditCard => "Cartão de Crédito",
            PaymentMethod::DebitCard => "Cartão de Débito",
            PaymentMethod::Pix => "PIX",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Pix => "pix",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    /// Accepts the serialized names plus the short forms operators type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "dinheiro" => Ok(PaymentMethod::Cash),
            "credit_card" | "credit" | "credito" | "crédito" => Ok(PaymentMethod::CreditCard),
            "debit_card" | "debit" | "debito" | "débito" => Ok(PaymentMethod::DebitCard),
            "pix" => Ok(PaymentMethod::Pix),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once appended to the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// Human-readable `YYYYMMDD-NNNNNN`.
    pub receipt_number: String,
    /// May reference a customer that was deleted later.
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Frozen copy of the cart at commit time.
    pub lines: Vec<CartLine>,
    pub subtotal_cents: i64,
    /// Discount in basis points (1000 = 10%).
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub note: Option<String>,
    pub cashier_name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// CPF or CNPJ, digits only.
    pub document: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied customer fields; `id: None` creates a new customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub document: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerInput {
    pub fn new(name: impl Into<String>, document: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            document: document.into(),
            ..Self::default()
        }
    }
}

// =============================================================================
// Product Group
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductGroup {
    pub id: String,
    pub name: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p1".to_string(),
            barcode: "7891234567895".to_string(),
            name: "Arroz 5kg".to_string(),
            price_cents,
            stock_quantity: stock,
            group: "Mercearia".to_string(),
            image_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_cart_line_snapshot() {
        let p = product(1000, 5);
        let mut line = CartLine::from_product(&p, 2).unwrap();
        assert_eq!(line.line_subtotal_cents, 2000);

        line.set_quantity(3).unwrap();
        assert_eq!(line.line_subtotal(), Money::from_cents(3000));
        assert_eq!(line.unit_price_cents, 1000);
    }

    #[test]
    fn test_cart_line_subtotal_overflow() {
        let p = product(10_000_000_000_000, 1_000_000);
        assert!(matches!(
            CartLine::from_product(&p, 1_000_000),
            Err(ValidationError::OutOfRange { .. })
        ));

        let mut line = CartLine::from_product(&p, 2).unwrap();
        assert!(line.set_quantity(1_000_000).is_err());
        assert_eq!(line.quantity, 2);
        assert_eq!(line.line_subtotal_cents, 20_000_000_000_000);
    }

    #[test]
    fn test_product_can_sell() {
        let p = product(1000, 2);
        assert!(p.in_stock());
        assert!(p.can_sell(2));
        assert!(!p.can_sell(3));
        assert!(!product(1000, 0).in_stock());
    }

    #[test]
    fn test_product_serializes_camel_case() {
        let json = serde_json::to_value(product(550, 1)).unwrap();
        assert_eq!(json["priceCents"], 550);
        assert_eq!(json["stockQuantity"], 1);
        assert!(json.get("imageRef").is_none());
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("pix".parse::<PaymentMethod>().unwrap(), PaymentMethod::Pix);
        assert_eq!("Dinheiro".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert_eq!("credit".parse::<PaymentMethod>().unwrap(), PaymentMethod::CreditCard);
        assert_eq!("débito".parse::<PaymentMethod>().unwrap(), PaymentMethod::DebitCard);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_payment_method_serde() {
        let json = serde_json::to_string(&PaymentMethod::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
        for method in PaymentMethod::ALL {
            assert_eq!(method.as_str().parse::<PaymentMethod>().unwrap(), method);
        }
    }

    #[test]
    fn test_stock_policy_parse() {
        assert_eq!("clamp".parse::<StockPolicy>().unwrap(), StockPolicy::Clamp);
        assert_eq!("REJECT".parse::<StockPolicy>().unwrap(), StockPolicy::Reject);
        assert!("ignore".parse::<StockPolicy>().is_err());
        assert_eq!(StockPolicy::default(), StockPolicy::Clamp);
    }

    #[test]
    fn test_product_input_from_product() {
        let input = ProductInput::from(product(1000, 5));
        assert_eq!(input.id.as_deref(), Some("p1"));
        assert_eq!(input.barcode.as_deref(), Some("7891234567895"));
    }
}
