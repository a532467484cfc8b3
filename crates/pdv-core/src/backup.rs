//! # Backup
//!
//! Export and restore of the whole store as one JSON document.
//!
//! ## Document Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "version":         "1.0",          required                         │
//! │    "usuarios":        [ ... ],        required (opaque records)         │
//! │    "clientes":        [ Customer ],   required                         │
//! │    "produtos":        [ Product ],    optional                         │
//! │    "vendas":          [ Sale ],       optional                         │
//! │    "grupos_produtos": [ Group ],      optional                         │
//! │    "config":          Settings,       optional                         │
//! │    "timestamp":       RFC 3339        optional                         │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Restore Rules
//! 1. The whole document is parsed and validated before any write
//! 2. A missing required key rejects the restore with `InvalidBackupFormat`
//! 3. Absent optional keys leave the matching collection untouched
//! 4. All writes go through one `save_collections` batch

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::barcode;
use crate::error::{CoreError, CoreResult};
use crate::settings::Settings;
use crate::store::{self, Collection, CollectionStore};
use crate::types::{Customer, Product, ProductGroup, Sale};
use crate::validation::{validate_price_cents, validate_product_name, validate_stock_quantity};

/// Version written by [`export`].
pub const BACKUP_VERSION: &str = "1.0";

/// Keys that must be present for a restore to start.
pub const REQUIRED_KEYS: [&str; 3] = ["version", "usuarios", "clientes"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: String,

    #[serde(rename = "usuarios")]
    pub users: Vec<Value>,

    #[serde(rename = "clientes")]
    pub customers: Vec<Customer>,

    #[serde(rename = "produtos", default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,

    #[serde(rename = "vendas", default, skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<Sale>>,

    #[serde(rename = "grupos_produtos", default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<ProductGroup>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Settings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// What a restore wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreReport {
    pub collections: Vec<Collection>,
    pub users: usize,
    pub customers: usize,
    pub products: Option<usize>,
    pub sales: Option<usize>,
    pub groups: Option<usize>,
}

impl Backup {
    /// Parses and validates a backup document.
    pub fn parse(json: &str) -> CoreResult<Self> {
        let mut value: Value = serde_json::from_str(json)
            .map_err(|e| CoreError::invalid_backup(format!("not valid JSON: {}", e)))?;

        let object = value
            .as_object_mut()
            .ok_or_else(|| CoreError::invalid_backup("top level must be an object"))?;
        for key in REQUIRED_KEYS {
            if !object.contains_key(key) {
                return Err(CoreError::invalid_backup(format!(
                    "missing required key '{}'",
                    key
                )));
            }
        }

        // Older exports wrote the version as a bare number
        let numeric_version = match object.get("version") {
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        if let Some(version) = numeric_version {
            object.insert("version".to_string(), Value::String(version));
        }

        let backup: Backup =
            serde_json::from_value(value).map_err(|e| CoreError::invalid_backup(e.to_string()))?;
        backup.validate()?;
        Ok(backup)
    }

    /// Serializes as pretty-printed JSON.
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::invalid_backup(e.to_string()))
    }

    /// Checks product invariants and id uniqueness.
    pub fn validate(&self) -> CoreResult<()> {
        if self.version.trim().is_empty() {
            return Err(CoreError::invalid_backup("version is empty"));
        }

        if let Some(products) = &self.products {
            let mut ids = HashSet::new();
            let mut barcodes = HashSet::new();
            for product in products {
                let problem = validate_product_name(&product.name)
                    .and_then(|_| validate_price_cents(product.price_cents))
                    .and_then(|_| validate_stock_quantity(product.stock_quantity))
                    .map_err(|e| e.to_string())
                    .err()
                    .or_else(|| {
                        (!barcode::validate(&product.barcode))
                            .then(|| format!("invalid barcode '{}'", product.barcode))
                    })
                    .or_else(|| {
                        (!ids.insert(product.id.as_str())).then(|| "duplicate id".to_string())
                    })
                    .or_else(|| {
                        (!barcodes.insert(product.barcode.as_str()))
                            .then(|| "duplicate barcode".to_string())
                    });

                if let Some(problem) = problem {
                    return Err(CoreError::invalid_backup(format!(
                        "product '{}': {}",
                        product.id, problem
                    )));
                }
            }
        }

        let mut customer_ids = HashSet::new();
        for customer in &self.customers {
            if !customer_ids.insert(customer.id.as_str()) {
                return Err(CoreError::invalid_backup(format!(
                    "customer '{}': duplicate id",
                    customer.id
                )));
            }
        }

        Ok(())
    }
}

/// Snapshot of every collection (the cart is session state and is skipped).
pub async fn export<S: CollectionStore>(store: &S) -> CoreResult<Backup> {
    let backup = Backup {
        version: BACKUP_VERSION.to_string(),
        users: store.load_collection(Collection::Users).await?,
        customers: store::load_records(store, Collection::Customers).await?,
        products: Some(store::load_records(store, Collection::Products).await?),
        sales: Some(store::load_records(store, Collection::Sales).await?),
        groups: Some(store::load_records(store, Collection::Groups).await?),
        config: Some(Settings::load(store).await?),
        timestamp: Some(Utc::now()),
    };

    info!(
        customers = backup.customers.len(),
        products = backup.products.as_ref().map_or(0, Vec::len),
        sales = backup.sales.as_ref().map_or(0, Vec::len),
        "Backup exported"
    );
    Ok(backup)
}

/// Writes a validated backup in a single batch.
pub async fn restore<S: CollectionStore>(store: &S, backup: &Backup) -> CoreResult<RestoreReport> {
    backup.validate()?;

    let mut batch = vec![
        (Collection::Users, backup.users.clone()),
        (
            Collection::Customers,
            store::encode_records(Collection::Customers, &backup.customers)?,
        ),
    ];
    if let Some(products) = &backup.products {
        batch.push((Collection::Products, store::encode_records(Collection::Products, products)?));
    }
    if let Some(sales) = &backup.sales {
        batch.push((Collection::Sales, store::encode_records(Collection::Sales, sales)?));
    }
    if let Some(groups) = &backup.groups {
        batch.push((Collection::Groups, store::encode_records(Collection::Groups, groups)?));
    }
    if let Some(config) = &backup.config {
        batch.push((
            Collection::Config,
            store::encode_records(Collection::Config, std::slice::from_ref(config))?,
        ));
    }

    let report = RestoreReport {
        collections: batch.iter().map(|(c, _)| *c).collect(),
        users: backup.users.len(),
        customers: backup.customers.len(),
        products: backup.products.as_ref().map(Vec::len),
        sales: backup.sales.as_ref().map(Vec::len),
        groups: backup.groups.as_ref().map(Vec::len),
    };
    store.save_collections(batch).await?;

    info!(
        version = %backup.version,
        collections = report.collections.len(),
        "Backup restored"
    );
    Ok(report)
}

/// Parses `json` and restores it.
pub async fn restore_json<S: CollectionStore>(store: &S, json: &str) -> CoreResult<RestoreReport> {
    let backup = Backup::parse(json)?;
    restore(store, &backup).await
}

// =============================================================================
// Unit Tests
// =============================================================================
