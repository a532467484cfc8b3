//! # Sale Ledger
//!
//! Append-only list of committed sales (the `sales` collection).
//!
//! Sales are never edited or removed once appended. Reports read the ledger
//! and aggregate in memory.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::store::{self, Collection, CollectionStore};
use crate::types::{PaymentMethod, Sale};

/// Totals for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentTotal {
    pub method: PaymentMethod,
    pub count: usize,
    pub total_cents: i64,
}

/// Aggregate over a set of sales.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: usize,
    pub item_count: i64,
    pub gross_cents: i64,
    pub discount_cents: i64,
    pub net_cents: i64,
    /// Only methods with at least one sale, in [`PaymentMethod::ALL`] order.
    pub by_payment: Vec<PaymentTotal>,
}

impl SalesSummary {
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        let mut summary = SalesSummary::default();
        let mut per_method = [(0usize, 0i64); PaymentMethod::ALL.len()];

        for sale in sales {
            summary.sale_count += 1;
            summary.item_count += sale.item_count();
            summary.gross_cents += sale.subtotal_cents;
            summary.discount_cents += sale.discount_cents;
            summary.net_cents += sale.total_cents;

            if let Some(slot) = PaymentMethod::ALL
                .iter()
                .position(|m| *m == sale.payment_method)
            {
                per_method[slot].0 += 1;
                per_method[slot].1 += sale.total_cents;
            }
        }

        summary.by_payment = PaymentMethod::ALL
            .iter()
            .zip(per_method)
            .filter(|(_, (count, _))| *count > 0)
            .map(|(method, (count, total_cents))| PaymentTotal {
                method: *method,
                count,
                total_cents,
            })
            .collect();
        summary
    }
}

/// Append-only sale history backed by a [`CollectionStore`].
pub struct SaleLedger<S> {
    store: Arc<S>,
}

impl<S> Clone for SaleLedger<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CollectionStore> SaleLedger<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All sales, oldest first.
    pub async fn list(&self) -> CoreResult<Vec<Sale>> {
        Ok(store::load_records(&*self.store, Collection::Sales).await?)
    }

    pub async fn len(&self) -> CoreResult<usize> {
        Ok(self.store.load_collection(Collection::Sales).await?.len())
    }

    pub async fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.len().await? == 0)
    }

    /// Finds a sale by id or receipt number.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Sale>> {
        let key = key.trim();
        Ok(self
            .list()
            .await?
            .into_iter()
            .find(|s| s.id == key || s.receipt_number == key))
    }

    /// Appends a sale. Ids are unique within the ledger.
    pub async fn append(&self, sale: &Sale) -> CoreResult<()> {
        let mut sales = self.list().await?;
        if sales.iter().any(|s| s.id == sale.id) {
            return Err(ValidationError::Duplicate {
                field: "sale id".to_string(),
                value: sale.id.clone(),
            }
            .into());
        }

        sales.push(sale.clone());
        store::save_records(&*self.store, Collection::Sales, &sales).await?;

        debug!(sale_id = %sale.id, ledger_len = sales.len(), "Sale appended");
        Ok(())
    }

    /// Sales referencing `customer_id`, including those of deleted customers.
    pub async fn for_customer(&self, customer_id: &str) -> CoreResult<Vec<Sale>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|s| s.customer_id.as_deref() == Some(customer_id))
            .collect())
    }

    /// Summary over the whole ledger, or over one local calendar day.
    pub async fn summary(&self, day: Option<NaiveDate>) -> CoreResult<SalesSummary> {
        let sales = self.list().await?;
        Ok(SalesSummary::from_sales(sales.iter().filter(|s| match day {
            Some(day) => s.created_at.with_timezone(&Local).date_naive() == day,
            None => true,
        })))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn sale(id: &str, customer: Option<&str>, method: PaymentMethod, total: i64) -> Sale {
        Sale {
            id: id.to_string(),
            receipt_number: format!("20240101-{:0>6}", id),
            customer_id: customer.map(str::to_string),
            payment_method: method,
            lines: Vec::new(),
            subtotal_cents: total + 100,
            discount_bps: 0,
            discount_cents: 100,
            total_cents: total,
            note: None,
            cashier_name: "Maria".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_and_get() {
        let ledger = SaleLedger::new(Arc::new(MemoryStore::new()));
        ledger.append(&sale("1", None, PaymentMethod::Cash, 1000)).await.unwrap();
        ledger.append(&sale("2", None, PaymentMethod::Pix, 500)).await.unwrap();

        assert_eq!(ledger.len().await.unwrap(), 2);
        assert_eq!(ledger.get("2").await.unwrap().unwrap().total_cents, 500);
        assert_eq!(
            ledger.get("20240101-000001").await.unwrap().unwrap().id,
            "1"
        );
        assert!(ledger.get("3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_rejects_duplicate_id() {
        let ledger = SaleLedger::new(Arc::new(MemoryStore::new()));
        let s = sale("1", None, PaymentMethod::Cash, 1000);
        ledger.append(&s).await.unwrap();

        let err = ledger.append(&s).await.unwrap_err();
        assert!(matches!(err, CoreError::Validation(ValidationError::Duplicate { .. })));
        assert_eq!(ledger.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_for_customer() {
        let ledger = SaleLedger::new(Arc::new(MemoryStore::new()));
        ledger.append(&sale("1", Some("c1"), PaymentMethod::Cash, 1000)).await.unwrap();
        ledger.append(&sale("2", Some("c2"), PaymentMethod::Cash, 1000)).await.unwrap();
        ledger.append(&sale("3", Some("c1"), PaymentMethod::Pix, 1000)).await.unwrap();

        let ids: Vec<String> = ledger
            .for_customer("c1")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, ["1", "3"]);
    }

    #[tokio::test]
    async fn test_summary() {
        let ledger = SaleLedger::new(Arc::new(MemoryStore::new()));
        ledger.append(&sale("1", None, PaymentMethod::Pix, 1000)).await.unwrap();
        ledger.append(&sale("2", None, PaymentMethod::Cash, 500)).await.unwrap();
        ledger.append(&sale("3", None, PaymentMethod::Pix, 250)).await.unwrap();

        let summary = ledger.summary(None).await.unwrap();
        assert_eq!(summary.sale_count, 3);
        assert_eq!(summary.net_cents, 1750);
        assert_eq!(summary.discount_cents, 300);
        assert_eq!(summary.gross_cents, 2050);
        assert_eq!(
            summary.by_payment,
            vec![
                PaymentTotal { method: PaymentMethod::Cash, count: 1, total_cents: 500 },
                PaymentTotal { method: PaymentMethod::Pix, count: 2, total_cents: 1250 },
            ]
        );

        let today = Local::now().date_naive();
        assert_eq!(ledger.summary(Some(today)).await.unwrap().sale_count, 3);
        let long_ago = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(ledger.summary(Some(long_ago)).await.unwrap().sale_count, 0);
    }
}
