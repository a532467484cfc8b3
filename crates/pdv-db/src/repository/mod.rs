//! # Repository Module
//!
//! Database implementations of pdv-core's persistence seam.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inventory / CartEngine / SaleLedger / ...                              │
//! │       │                                                                 │
//! │       │  store.load_collection(Collection::Products)                   │
//! │       ▼                                                                 │
//! │  SqliteCollectionStore                                                 │
//! │  ├── load_collection(name)        SELECT payload                       │
//! │  ├── save_collection(name, rows)  INSERT .. ON CONFLICT DO UPDATE      │
//! │  └── save_collections(batch)      same, inside one transaction         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite: collections(name, payload, updated_at)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod collection;
