//! # pdv-core: Business Logic for the PDV
//!
//! This crate is the **heart** of the PDV. It holds the catalog, cart and
//! checkout rules. Persistence is injected through the [`CollectionStore`]
//! trait, so nothing here opens a file or a socket.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           PDV Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 apps/terminal (operator console)                │   │
//! │  │    scan / type ──► cart commands ──► :pay ──► receipt           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 ★ pdv-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ barcode  │ │  fuzzy   │ │inventory │ │   cart   │          │   │
//! │  │   │ EAN-13   │ │ Jaro-W.  │ │ products │ │  engine  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────┬─────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌────▼─────┐          │   │
//! │  │   │ ledger   │ │customers │ │  backup  │ │   sale   │          │   │
//! │  │   │ (append) │ │ groups   │ │ receipt  │ │committer │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │        store::CollectionStore (trait) + MemoryStore             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              pdv-db: SqliteCollectionStore (sqlx)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`ids`] - UUIDs and receipt numbers
//! - [`barcode`] - EAN-13 validation and generation
//! - [`fuzzy`] - Jaro-Winkler fallback lookup
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (Product, CartLine, Sale, Customer, ...)
//! - [`store`] - Persistence seam and in-memory store
//! - [`inventory`] - Product catalog and stock movements
//! - [`cart`] - Cart engine
//! - [`sale`] - Sale committer
//! - [`ledger`], [`customers`], [`groups`], [`settings`] - Other collections
//! - [`receipt`], [`backup`], [`scanner`] - Edges of the system
//!
//! ## Design Principles
//!
//! 1. **No I/O**: persistence is an injected trait; tests use [`MemoryStore`]
//! 2. **Integer Money**: all monetary values are in cents (i64)
//! 3. **Explicit Errors**: business conditions are [`CoreError`] variants, never panics
//! 4. **Validate, then write**: checkout rejects before touching any collection
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use pdv_core::{CartEngine, CheckoutRequest, Inventory, MemoryStore, PaymentMethod,
//!                ProductInput, SaleCommitter};
//!
//! # let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # rt.block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! let inventory = Inventory::new(store);
//! let arroz = inventory.upsert(ProductInput::new("Arroz 5kg", 1000, 10)).await?;
//!
//! let mut cart = CartEngine::open(inventory.clone()).await?;
//! cart.add_item(&arroz, 2).await?;
//!
//! let sale = SaleCommitter::new(inventory)
//!     .commit(&mut cart, CheckoutRequest::new(PaymentMethod::Pix, "Maria"))
//!     .await?;
//! assert_eq!(sale.total_cents, 2000);
//! # Ok::<(), pdv_core::CoreError>(())
//! # }).unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backup;
pub mod barcode;
pub mod cart;
pub mod customers;
pub mod error;
pub mod fuzzy;
pub mod groups;
pub mod ids;
pub mod inventory;
pub mod ledger;
pub mod money;
pub mod receipt;
pub mod sale;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use pdv_core::Money` instead of
// `use pdv_core::money::Money`

pub use barcode::Barcode;
pub use cart::{CartEngine, CartTotals};
pub use customers::CustomerBook;
pub use error::{CoreError, CoreResult, ErrorKind, StoreError, StoreResult, ValidationError};
pub use groups::GroupBook;
pub use inventory::{Inventory, StockChange};
pub use ledger::{SaleLedger, SalesSummary};
pub use money::Money;
pub use sale::{CheckoutRequest, SaleCommitter};
pub use settings::Settings;
pub use store::{Collection, CollectionStore, MemoryStore};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Longest product, customer, group or cashier name.
pub const MAX_NAME_LEN: usize = 200;

/// Longest free-text note on a sale.
pub const MAX_NOTE_LEN: usize = 500;

/// Receipt width for 80mm thermal paper in font A.
pub const DEFAULT_RECEIPT_WIDTH: usize = 40;

/// Results shown by the product picker.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;
