//! # Product Commands
//!
//! Catalog search, registration and restocking from the console.
//!
//! ## Search Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  :find feijao                                                           │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Inventory::search(query, search_limit)                                │
//! │    1. name contains / barcode prefix                                   │
//! │    2. fuzzy (Jaro-Winkler ≥ threshold)                                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  7891234567895  Feijão Carioca 1kg          8,90   (12)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use pdv_core::{CollectionStore, Product, ProductInput, Settings};
use tracing::debug;

use crate::error::CommandError;
use crate::state::Session;

/// Lists products matching `query`.
pub async fn find<S: CollectionStore>(
    session: &Session<S>,
    query: &str,
) -> Result<String, CommandError> {
    debug!(query = %query, "find command");
    let products = session
        .inventory()
        .search(query, session.config().search_limit)
        .await?;

    if products.is_empty() {
        return Ok(format!("Nenhum produto para '{}'", query));
    }
    Ok(products
        .iter()
        .map(|p| product_row(p, session.settings()))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Registers a product; its group is created on first use.
pub async fn create<S: CollectionStore>(
    session: &mut Session<S>,
    input: ProductInput,
) -> Result<String, CommandError> {
    if !input.group.trim().is_empty() {
        session.groups().ensure(&input.group).await?;
    }
    let product = session.inventory().upsert(input).await?;
    Ok(format!("Produto cadastrado\n{}", product_row(&product, session.settings())))
}

/// Adds stock to the product a barcode or id names.
pub async fn restock<S: CollectionStore>(
    session: &mut Session<S>,
    code: &str,
    quantity: i64,
) -> Result<String, CommandError> {
    let change = session.inventory().restock(code, quantity).await?;
    let product = session.inventory().require(&change.product_id).await?;
    Ok(format!(
        "{}: estoque {} -> {}",
        product.name, change.previous, change.current
    ))
}

fn product_row(product: &Product, settings: &Settings) -> String {
    let mut row = format!(
        "{}  {:<30} {:>10}  ({})",
        product.barcode,
        truncate(&product.name, 30),
        settings.format_amount(product.price()),
        product.stock_quantity
    );
    if !product.group.is_empty() {
        row.push_str(&format!("  [{}]", product.group));
    }
    row
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
