//! # Cart Engine
//!
//! The checkout state machine: accumulates lines against stock and persists
//! the cart after every mutation.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  scan / type code                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_by_code ──► Barcode::parse or Inventory::lookup                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  add_item(product, qty)                                                 │
//! │       ├── qty < 1                 → InvalidQuantity                     │
//! │       ├── stock ≤ 0               → OutOfStock                          │
//! │       ├── in cart + qty > stock   → InsufficientStock                   │
//! │       └── merge or append ──► save `cart` ──► swap in                   │
//! │                                                                         │
//! │  update_quantity ─► re-reads stock from the inventory                   │
//! │  remove_item     ─► false when absent                                   │
//! │  clear           ─► persists the empty cart                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A mutation builds the next line list, saves it, and only then replaces
//! the in-memory lines. A failed save leaves the cart exactly as it was.

use serde::Serialize;
use tracing::{debug, error};
use ts_rs::TS;

use crate::barcode::Barcode;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::inventory::Inventory;
use crate::money::Money;
use crate::store::{self, Collection, CollectionStore};
use crate::types::{CartLine, Product};

// =============================================================================
// Totals
// =============================================================================

/// Calculated totals for the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartTotals {
    /// Number of distinct lines.
    pub line_count: usize,
    /// Sum of all quantities.
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub discount_bps: u32,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Converts a discount percentage to basis points.
///
/// Fails with `InvalidDiscount` when the value is NaN, infinite, or outside
/// [0, 100].
pub fn discount_bps(percent: f64) -> CoreResult<u32> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(CoreError::InvalidDiscount { percent });
    }
    Ok((percent * 100.0).round() as u32)
}

/// Totals for an arbitrary line list.
///
/// ## Calculation
/// ```text
/// subtotal = Σ line_subtotal
/// discount = round_half_up(subtotal × bps / 10000)
/// total    = subtotal − discount
/// ```
pub fn totals_for(lines: &[CartLine], discount_percent: f64) -> CoreResult<CartTotals> {
    let bps = discount_bps(discount_percent)?;
    let mut subtotal = Money::zero();
    let mut total_quantity: i64 = 0;
    for line in lines {
        subtotal = subtotal
            .checked_add(line.line_subtotal())
            .ok_or_else(|| out_of_range("subtotal"))?;
        total_quantity = total_quantity
            .checked_add(line.quantity)
            .ok_or_else(|| out_of_range("total_quantity"))?;
    }
    let discount = subtotal.percentage(bps);

    Ok(CartTotals {
        line_count: lines.len(),
        total_quantity,
        subtotal_cents: subtotal.cents(),
        discount_bps: bps,
        discount_cents: discount.cents(),
        total_cents: (subtotal - discount).cents(),
    })
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

// =============================================================================
// Cart Engine
// =============================================================================

/// The active cart of one checkout session.
pub struct CartEngine<S> {
    inventory: Inventory<S>,
    lines: Vec<CartLine>,
}

impl<S: CollectionStore> CartEngine<S> {
    /// Opens the session cart, resuming whatever the store holds.
    pub async fn open(inventory: Inventory<S>) -> CoreResult<Self> {
        let lines: Vec<CartLine> =
            store::load_records(&**inventory.store(), Collection::Cart).await?;
        if !lines.is_empty() {
            debug!(lines = lines.len(), "Resumed persisted cart");
        }
        Ok(Self { inventory, lines })
    }

    pub fn inventory(&self) -> &Inventory<S> {
        &self.inventory
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, barcode: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.barcode == barcode)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Adds `quantity` units of `product`, merging with an existing line.
    ///
    /// Stock is checked against the product record passed in. A merged line
    /// keeps the price captured at the first add.
    pub async fn add_item(&mut self, product: &Product, quantity: i64) -> CoreResult<CartLine> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { quantity });
        }
        if !product.in_stock() {
            return Err(CoreError::OutOfStock {
                barcode: product.barcode.clone(),
                name: product.name.clone(),
            });
        }

        let existing = self.line(&product.barcode).map(|l| l.quantity).unwrap_or(0);
        let requested = existing.checked_add(quantity).unwrap_or(i64::MAX);
        if !product.can_sell(requested) {
            return Err(CoreError::InsufficientStock {
                barcode: product.barcode.clone(),
                available: product.stock_quantity,
                requested,
            });
        }

        let mut next = self.lines.clone();
        let index = match next.iter().position(|l| l.barcode == product.barcode) {
            Some(index) => {
                next[index].set_quantity(requested)?;
                index
            }
            None => {
                next.push(CartLine::from_product(product, quantity)?);
                next.len() - 1
            }
        };
        let line = next[index].clone();
        self.persist(next).await?;

        debug!(barcode = %line.barcode, quantity = line.quantity, "Cart line added");
        Ok(line)
    }

    /// Resolves a typed or scanned code and adds it.
    ///
    /// All-digit input is treated as a barcode and must pass EAN-13
    /// validation. Anything else goes through [`Inventory::lookup`] (id, then
    /// fuzzy name).
    pub async fn add_by_code(&mut self, code: &str, quantity: i64) -> CoreResult<CartLine> {
        let code = code.trim();
        let product = if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
            let barcode = Barcode::parse(code)?;
            self.inventory.require(barcode.as_str()).await?
        } else {
            self.inventory
                .lookup(code)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(code.to_string()))?
        };

        self.add_item(&product, quantity).await
    }

    /// Removes the line for `barcode`. Returns whether a line was removed.
    pub async fn remove_item(&mut self, barcode: &str) -> CoreResult<bool> {
        let barcode = barcode.trim();
        if self.line(barcode).is_none() {
            return Ok(false);
        }

        let next: Vec<CartLine> = self
            .lines
            .iter()
            .filter(|l| l.barcode != barcode)
            .cloned()
            .collect();
        self.persist(next).await?;

        debug!(barcode = %barcode, "Cart line removed");
        Ok(true)
    }

    /// Overwrites a line's quantity after re-reading stock from the inventory.
    pub async fn update_quantity(&mut self, barcode: &str, quantity: i64) -> CoreResult<CartLine> {
        let barcode = barcode.trim();
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { quantity });
        }
        let index = self
            .lines
            .iter()
            .position(|l| l.barcode == barcode)
            .ok_or_else(|| CoreError::NotInCart(barcode.to_string()))?;

        let product = self.inventory.require(barcode).await?;
        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                barcode: barcode.to_string(),
                available: product.stock_quantity,
                requested: quantity,
            });
        }

        let mut next = self.lines.clone();
        next[index].set_quantity(quantity)?;
        let line = next[index].clone();
        self.persist(next).await?;

        debug!(barcode = %barcode, quantity, "Cart quantity updated");
        Ok(line)
    }

    /// Empties the cart and persists the empty state.
    pub async fn clear(&mut self) -> CoreResult<()> {
        self.persist(Vec::new()).await?;
        debug!("Cart cleared");
        Ok(())
    }

    /// Totals for the current lines at `discount_percent` (0 to 100).
    pub fn compute_totals(&self, discount_percent: f64) -> CoreResult<CartTotals> {
        totals_for(&self.lines, discount_percent)
    }

    async fn persist(&mut self, next: Vec<CartLine>) -> CoreResult<()> {
        if let Err(e) = store::save_records(&**self.inventory.store(), Collection::Cart, &next).await
        {
            error!(error = %e, "Failed to persist cart");
            return Err(e.into());
        }
        self.lines = next;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
