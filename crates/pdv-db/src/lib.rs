//! # pdv-db: Database Layer for the PDV
//!
//! SQLite storage for pdv-core's [`CollectionStore`](pdv_core::CollectionStore)
//! seam, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PDV Data Flow                                  │
//! │                                                                         │
//! │  Terminal command (:pay pix)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  pdv-core: SaleCommitter / Inventory / CartEngine                      │
//! │       │  CollectionStore::{load,save}_collection                       │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     pdv-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌──────────────────────┐  ┌───────────┐ │   │
//! │  │   │   Database    │    │ SqliteCollection     │  │Migrations │ │   │
//! │  │   │   (pool.rs)   │◄───│ Store                │  │(embedded) │ │   │
//! │  │   │ SqlitePool    │    │ one row / collection │  │001_*.sql  │ │   │
//! │  │   └───────────────┘    └──────────────────────┘  └───────────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file: <data dir>/pdv.db                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The collection store
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pdv_db::{Database, DbConfig};
//! use pdv_core::Inventory;
//!
//! let db = Database::new(DbConfig::new("path/to/pdv.db")).await?;
//! let inventory = Inventory::new(Arc::new(db.collections()));
//! let products = inventory.search("arroz", 20).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, IN_MEMORY_PATH};
pub use repository::collection::SqliteCollectionStore;
