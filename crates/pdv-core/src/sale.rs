//! # Sale Committer
//!
//! Turns the cart into an immutable [`Sale`], deducts stock and clears the
//! cart.
//!
//! ## Commit Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  VALIDATE (nothing written yet)                                         │
//! │    1. cart has lines                       else EmptyCart               │
//! │    2. totals; total > 0                    else InvalidDiscount /       │
//! │                                                 ZeroOrNegativeTotal     │
//! │    3. customer resolves (when given)       else CustomerNotFound        │
//! │       every product still exists           else ProductNotFound         │
//! │       stock covers lines (Reject policy)   else InsufficientStock       │
//! │       cashier named, note not too long     else Validation              │
//! │                                                                         │
//! │  COMMIT                                                                 │
//! │    4. id, timestamp, receipt number; freeze lines                       │
//! │    5. ledger.append(sale)                                               │
//! │    6. decrement_stock per line                                          │
//! │    7. cart.clear()                                                      │
//! │    8. return sale                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejection in steps 1-3 leaves cart, inventory and ledger untouched.
//! Steps 5-7 are separate writes; a storage failure between them surfaces as
//! `StorageError` without rolling back earlier writes.

use chrono::{Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use ts_rs::TS;

use crate::cart::CartEngine;
use crate::customers::CustomerBook;
use crate::error::{CoreError, CoreResult};
use crate::ids;
use crate::inventory::Inventory;
use crate::ledger::SaleLedger;
use crate::store::CollectionStore;
use crate::types::{PaymentMethod, Sale, StockPolicy};
use crate::validation::{validate_cashier_name, validate_note};

/// Everything checkout needs besides the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub note: Option<String>,
    pub cashier_name: String,
}

impl CheckoutRequest {
    pub fn new(payment_method: PaymentMethod, cashier_name: impl Into<String>) -> Self {
        Self {
            customer_id: None,
            payment_method,
            discount_percent: 0.0,
            note: None,
            cashier_name: cashier_name.into(),
        }
    }

    pub fn with_customer(mut self, customer_id: impl Into<String>) -> Self {
        self.customer_id = Some(customer_id.into());
        self
    }

    pub fn with_discount(mut self, percent: f64) -> Self {
        self.discount_percent = percent;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Commits carts against the inventory, customers and ledger of one store.
pub struct SaleCommitter<S> {
    inventory: Inventory<S>,
    customers: CustomerBook<S>,
    ledger: SaleLedger<S>,
}

impl<S: CollectionStore> SaleCommitter<S> {
    /// Builds a committer over the inventory's store, sharing its stock policy.
    pub fn new(inventory: Inventory<S>) -> Self {
        let store = inventory.store().clone();
        Self {
            customers: CustomerBook::new(store.clone()),
            ledger: SaleLedger::new(store),
            inventory,
        }
    }

    pub fn ledger(&self) -> &SaleLedger<S> {
        &self.ledger
    }

    pub fn customers(&self) -> &CustomerBook<S> {
        &self.customers
    }

    /// Commits `cart` as a sale. See the module docs for the sequence.
    pub async fn commit(
        &self,
        cart: &mut CartEngine<S>,
        request: CheckoutRequest,
    ) -> CoreResult<Sale> {
        // 1. Something to sell
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        // 2. Totals
        let totals = cart.compute_totals(request.discount_percent)?;
        if totals.total_cents <= 0 {
            return Err(CoreError::ZeroOrNegativeTotal {
                total: totals.total(),
            });
        }

        // 3. References and inputs
        let customer_id = request
            .customer_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let customer_id = match customer_id {
            Some(key) => Some(self.customers.require(key).await?.id),
            None => None,
        };

        for line in cart.lines() {
            let product = self
                .inventory
                .get(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.barcode.clone()))?;
            if self.inventory.policy() == StockPolicy::Reject && !product.can_sell(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    barcode: line.barcode.clone(),
                    available: product.stock_quantity,
                    requested: line.quantity,
                });
            }
        }

        validate_cashier_name(&request.cashier_name)?;
        let note = request
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if let Some(note) = &note {
            validate_note(note)?;
        }

        // 4. Freeze
        let created_at = Utc::now();
        let sequence = self.ledger.len().await? + 1;
        let sale = Sale {
            id: ids::new_id(),
            receipt_number: ids::receipt_number(
                created_at.with_timezone(&Local).date_naive(),
                sequence,
            ),
            customer_id,
            payment_method: request.payment_method,
            lines: cart.lines().to_vec(),
            subtotal_cents: totals.subtotal_cents,
            discount_bps: totals.discount_bps,
            discount_cents: totals.discount_cents,
            total_cents: totals.total_cents,
            note,
            cashier_name: request.cashier_name.trim().to_string(),
            created_at,
        };

        // 5. Ledger
        self.ledger.append(&sale).await?;

        // 6. Stock
        for line in &sale.lines {
            let change = self
                .inventory
                .decrement_stock(&line.product_id, line.quantity)
                .await?;
            if change.clamped {
                warn!(
                    sale_id = %sale.id,
                    product_id = %change.product_id,
                    "Sale sold more than recorded stock"
                );
            }
        }

        // 7. Cart
        cart.clear().await?;

        info!(
            sale_id = %sale.id,
            receipt = %sale.receipt_number,
            lines = sale.lines.len(),
            total_cents = sale.total_cents,
            payment = sale.payment_method.as_str(),
            "Sale committed"
        );
        Ok(sale)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{CustomerInput, Product, ProductInput};
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        inventory: Inventory<MemoryStore>,
        cart: CartEngine<MemoryStore>,
        committer: SaleCommitter<MemoryStore>,
    }

    async fn fixture(policy: StockPolicy) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let inventory = Inventory::new(Arc::clone(&store)).with_policy(policy);
        let cart = CartEngine::open(inventory.clone()).await.unwrap();
        let committer = SaleCommitter::new(inventory.clone());
        Fixture {
            store,
            inventory,
            cart,
            committer,
        }
    }

    async fn stocked(f: &Fixture, name: &str, price: i64, stock: i64) -> Product {
        f.inventory
            .upsert(ProductInput::new(name, price, stock))
            .await
            .unwrap()
    }

    fn pix() -> CheckoutRequest {
        CheckoutRequest::new(PaymentMethod::Pix, "Maria")
    }

    #[tokio::test]
    async fn test_commit_happy_path() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        let b = stocked(&f, "Feijão", 550, 4).await;
        f.cart.add_item(&a, 2).await.unwrap();
        f.cart.add_item(&b, 1).await.unwrap();

        let sale = f
            .committer
            .commit(&mut f.cart, pix().with_discount(10.0).with_note(" troco 50 "))
            .await
            .unwrap();

        assert_eq!(sale.subtotal_cents, 2550);
        assert_eq!(sale.discount_cents, 255);
        assert_eq!(sale.total_cents, 2295);
        assert_eq!(sale.lines.len(), 2);
        assert_eq!(sale.note.as_deref(), Some("troco 50"));
        assert!(sale.receipt_number.ends_with("-000001"));

        assert!(f.cart.is_empty());
        assert_eq!(f.committer.ledger().len().await.unwrap(), 1);
        assert_eq!(f.inventory.require(&a.id).await.unwrap().stock_quantity, 8);
        assert_eq!(f.inventory.require(&b.id).await.unwrap().stock_quantity, 3);
    }

    #[tokio::test]
    async fn test_receipt_numbers_follow_ledger_length() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;

        for expected in ["-000001", "-000002"] {
            f.cart.add_item(&a, 1).await.unwrap();
            let sale = f.committer.commit(&mut f.cart, pix()).await.unwrap();
            assert!(sale.receipt_number.ends_with(expected));
        }
    }

    #[tokio::test]
    async fn test_empty_cart_touches_nothing() {
        let mut f = fixture(StockPolicy::Clamp).await;
        stocked(&f, "Arroz", 1000, 10).await;
        let writes = f.store.write_count();

        let err = f.committer.commit(&mut f.cart, pix()).await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
        assert_eq!(f.store.write_count(), writes);
        assert!(f.committer.ledger().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_zero_total_rejected() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let brinde = stocked(&f, "Brinde", 0, 10).await;
        f.cart.add_item(&brinde, 1).await.unwrap();

        let err = f.committer.commit(&mut f.cart, pix()).await.unwrap_err();
        assert!(matches!(err, CoreError::ZeroOrNegativeTotal { .. }));

        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();
        let err = f
            .committer
            .commit(&mut f.cart, pix().with_discount(100.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ZeroOrNegativeTotal { .. }));
        assert_eq!(f.cart.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_discount_rejected() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();

        let err = f
            .committer
            .commit(&mut f.cart, pix().with_discount(150.0))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscount { .. }));
    }

    #[tokio::test]
    async fn test_unknown_customer_touches_nothing() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 3).await.unwrap();

        let err = f
            .committer
            .commit(&mut f.cart, pix().with_customer("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::CustomerNotFound(ref id) if id == "ghost"));
        assert_eq!(f.cart.len(), 1);
        assert_eq!(f.inventory.require(&a.id).await.unwrap().stock_quantity, 10);
        assert!(f.committer.ledger().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_customer_is_recorded_and_survives_deletion() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let customer = f
            .committer
            .customers()
            .upsert(CustomerInput::new("Ana", "12345678909"))
            .await
            .unwrap();
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();

        // Document digits resolve to the customer id
        let sale = f
            .committer
            .commit(&mut f.cart, pix().with_customer("12345678909"))
            .await
            .unwrap();
        assert_eq!(sale.customer_id.as_deref(), Some(customer.id.as_str()));

        f.committer.customers().delete(&customer.id).await.unwrap();
        let history = f.committer.ledger().for_customer(&customer.id).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_product_rejected() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();
        f.inventory.delete(&a.id).await.unwrap();

        let err = f.committer.commit(&mut f.cart, pix()).await.unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
        assert_eq!(f.cart.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_cashier_rejected() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();

        let err = f
            .committer
            .commit(&mut f.cart, CheckoutRequest::new(PaymentMethod::Cash, " "))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert!(f.committer.ledger().is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_stock_shrank_after_add_clamps() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 5).await;
        f.cart.add_item(&a, 4).await.unwrap();

        let mut edit = ProductInput::from(a.clone());
        edit.stock_quantity = 1;
        f.inventory.upsert(edit).await.unwrap();

        f.committer.commit(&mut f.cart, pix()).await.unwrap();
        assert_eq!(f.inventory.require(&a.id).await.unwrap().stock_quantity, 0);
    }

    #[tokio::test]
    async fn test_stock_shrank_after_add_rejects_under_reject_policy() {
        let mut f = fixture(StockPolicy::Reject).await;
        let a = stocked(&f, "Arroz", 1000, 5).await;
        f.cart.add_item(&a, 4).await.unwrap();

        let mut edit = ProductInput::from(a.clone());
        edit.stock_quantity = 1;
        f.inventory.upsert(edit).await.unwrap();

        let err = f.committer.commit(&mut f.cart, pix()).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientStock { available: 1, requested: 4, .. }
        ));
        assert_eq!(f.inventory.require(&a.id).await.unwrap().stock_quantity, 1);
        assert!(f.committer.ledger().is_empty().await.unwrap());
        assert_eq!(f.cart.len(), 1);
    }

    #[tokio::test]
    async fn test_committed_sale_is_independent_of_cart() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 2).await.unwrap();
        let sale = f.committer.commit(&mut f.cart, pix()).await.unwrap();

        f.cart.add_item(&a, 5).await.unwrap();
        let stored = f.committer.ledger().get(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.lines[0].quantity, 2);
        assert_eq!(stored, sale);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let mut f = fixture(StockPolicy::Clamp).await;
        let a = stocked(&f, "Arroz", 1000, 10).await;
        f.cart.add_item(&a, 1).await.unwrap();

        f.store.set_fail_writes(true);
        let err = f.committer.commit(&mut f.cart, pix()).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.cart.len(), 1);
    }
}
