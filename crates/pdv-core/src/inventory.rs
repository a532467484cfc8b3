//! # Inventory Store
//!
//! Product records in the `products` collection: lookup, upsert, stock
//! movements.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  restock(id, +n)          stock += n                                    │
//! │  decrement_stock(id, n)   only called by the sale committer             │
//! │       │                                                                 │
//! │       ├── n ≤ stock          → stock -= n                               │
//! │       └── n > stock                                                     │
//! │             ├── Clamp  (default) → stock = 0, StockChange.clamped=true │
//! │             └── Reject           → InsufficientStock                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write replaces the whole collection (read-modify-write).

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::barcode::{self, Barcode};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::fuzzy;
use crate::ids;
use crate::store::{self, Collection, CollectionStore};
use crate::types::{Product, ProductInput, StockPolicy};
use crate::validation::{
    validate_price_cents, validate_product_name, validate_search_query, validate_stock_quantity,
};

/// Outcome of a stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub product_id: String,
    pub previous: i64,
    pub current: i64,
    /// True when a decrement asked for more than was on hand and the result
    /// was floored at zero.
    pub clamped: bool,
}

/// Product catalog backed by a [`CollectionStore`].
pub struct Inventory<S> {
    store: Arc<S>,
    policy: StockPolicy,
}

impl<S> Clone for Inventory<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: self.policy,
        }
    }
}

impl<S: CollectionStore> Inventory<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: StockPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StockPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> StockPolicy {
        self.policy
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// All products in insertion order.
    pub async fn list(&self) -> CoreResult<Vec<Product>> {
        Ok(store::load_records(&*self.store, Collection::Products).await?)
    }

    /// Finds a product by id or by barcode.
    pub async fn get(&self, key: &str) -> CoreResult<Option<Product>> {
        let key = key.trim();
        if key.is_empty() {
            return Ok(None);
        }
        let products = self.list().await?;
        Ok(find(&products, key).cloned())
    }

    /// Like [`Inventory::get`] but fails with `ProductNotFound`.
    pub async fn require(&self, key: &str) -> CoreResult<Product> {
        self.get(key)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(key.trim().to_string()))
    }

    /// Exact id/barcode match first, then the best fuzzy name match.
    pub async fn lookup(&self, query: &str) -> CoreResult<Option<Product>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(None);
        }

        let products = self.list().await?;
        if let Some(product) = find(&products, query) {
            return Ok(Some(product.clone()));
        }

        let found = fuzzy::best_match(query, &products, |p| p.name.as_str());
        if let Some((product, score)) = found {
            debug!(query = %query, product_id = %product.id, score, "Fuzzy lookup matched");
        }
        Ok(found.map(|(product, _)| product.clone()))
    }

    /// Catalog search for the product picker.
    ///
    /// Name substrings and barcode prefixes come first, then fuzzy matches.
    /// An empty query lists products by name.
    pub async fn search(&self, query: &str, limit: usize) -> CoreResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        let products = self.list().await?;

        if query.is_empty() {
            let mut all = products;
            all.sort_by_key(|p| p.name.to_lowercase());
            all.truncate(limit);
            return Ok(all);
        }

        let needle = query.to_lowercase();
        let mut results: Vec<Product> = products
            .iter()
            .filter(|p| p.name.to_lowercase().contains(&needle) || p.barcode.starts_with(&query))
            .cloned()
            .collect();

        for (product, _) in fuzzy::rank(&query, &products, |p| p.name.as_str()) {
            if !results.iter().any(|r| r.id == product.id) {
                results.push(product.clone());
            }
        }

        results.truncate(limit);
        Ok(results)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates or overwrites a product.
    ///
    /// ## Rules
    /// - name required, price and stock non-negative
    /// - a blank barcode gets a generated `789…` code
    /// - barcodes are EAN-13 and unique across the catalog
    /// - overwriting keeps `id` and `created_at`
    pub async fn upsert(&self, input: ProductInput) -> CoreResult<Product> {
        validate_product_name(&input.name)?;
        validate_price_cents(input.price_cents)?;
        validate_stock_quantity(input.stock_quantity)?;

        let mut products = self.list().await?;
        let existing = input
            .id
            .as_deref()
            .and_then(|id| products.iter().position(|p| p.id == id));
        let id = match (&input.id, existing) {
            (_, Some(index)) => products[index].id.clone(),
            (Some(id), None) if !id.trim().is_empty() => id.trim().to_string(),
            _ => ids::new_id(),
        };

        let barcode = match input.barcode.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Barcode::parse(raw)?.into_inner(),
            _ => unused_barcode(&products),
        };
        if products.iter().any(|p| p.barcode == barcode && p.id != id) {
            return Err(ValidationError::Duplicate {
                field: "barcode".to_string(),
                value: barcode,
            }
            .into());
        }

        let now = Utc::now();
        let product = Product {
            id,
            barcode,
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            stock_quantity: input.stock_quantity,
            group: input.group.trim().to_string(),
            image_ref: input.image_ref,
            created_at: existing.map(|i| products[i].created_at).unwrap_or(now),
            updated_at: now,
        };

        match existing {
            Some(index) => products[index] = product.clone(),
            None => products.push(product.clone()),
        }
        self.save(&products).await?;

        debug!(
            product_id = %product.id,
            barcode = %product.barcode,
            created = existing.is_none(),
            "Product saved"
        );
        Ok(product)
    }

    /// Removes a product. Returns false when the id is unknown.
    ///
    /// Sales and carts keep their snapshots of the removed product.
    pub async fn delete(&self, id: &str) -> CoreResult<bool> {
        let mut products = self.list().await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        if products.len() == before {
            return Ok(false);
        }
        self.save(&products).await?;
        info!(product_id = %id, "Product deleted");
        Ok(true)
    }

    /// Adds `quantity` units to a product's stock.
    pub async fn restock(&self, key: &str, quantity: i64) -> CoreResult<StockChange> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { quantity });
        }

        let mut products = self.list().await?;
        let index = position(&products, key)?;
        let product = &mut products[index];
        let previous = product.stock_quantity;
        product.stock_quantity = previous.saturating_add(quantity);
        product.updated_at = Utc::now();

        let change = StockChange {
            product_id: product.id.clone(),
            previous,
            current: product.stock_quantity,
            clamped: false,
        };
        self.save(&products).await?;

        info!(product_id = %change.product_id, previous, current = change.current, "Restocked");
        Ok(change)
    }

    /// Removes `quantity` units from stock according to the [`StockPolicy`].
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> CoreResult<StockChange> {
        if quantity < 1 {
            return Err(CoreError::InvalidQuantity { quantity });
        }

        let mut products = self.list().await?;
        let index = position(&products, id)?;
        let product = &mut products[index];
        let previous = product.stock_quantity;

        let (current, clamped) = if quantity <= previous {
            (previous - quantity, false)
        } else {
            match self.policy {
                StockPolicy::Clamp => {
                    warn!(
                        product_id = %product.id,
                        available = previous,
                        requested = quantity,
                        "Stock decrement exceeds available stock; clamping at zero"
                    );
                    (0, true)
                }
                StockPolicy::Reject => {
                    return Err(CoreError::InsufficientStock {
                        barcode: product.barcode.clone(),
                        available: previous,
                        requested: quantity,
                    })
                }
            }
        };

        product.stock_quantity = current;
        product.updated_at = Utc::now();
        let change = StockChange {
            product_id: product.id.clone(),
            previous,
            current,
            clamped,
        };
        self.save(&products).await?;

        debug!(product_id = %change.product_id, previous, current, "Stock decremented");
        Ok(change)
    }

    /// Replaces the whole catalog. Used by backup restore.
    pub(crate) async fn save(&self, products: &[Product]) -> CoreResult<()> {
        Ok(store::save_records(&*self.store, Collection::Products, products).await?)
    }
}

fn find<'a>(products: &'a [Product], key: &str) -> Option<&'a Product> {
    products
        .iter()
        .find(|p| p.id == key)
        .or_else(|| products.iter().find(|p| p.barcode == key))
}

fn position(products: &[Product], key: &str) -> CoreResult<usize> {
    let key = key.trim();
    products
        .iter()
        .position(|p| p.id == key)
        .or_else(|| products.iter().position(|p| p.barcode == key))
        .ok_or_else(|| CoreError::ProductNotFound(key.to_string()))
}

fn unused_barcode(products: &[Product]) -> String {
    loop {
        let code = barcode::generate();
        if !products.iter().any(|p| p.barcode == code) {
            return code;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
