//! # Collection Store
//!
//! The persistence seam. The core never opens files or connections; it reads
//! and replaces whole named collections through [`CollectionStore`].
//!
//! ## Collections
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  name        record            written by                              │
//! │  ──────────  ────────────────  ──────────────────────────────────────  │
//! │  products    Product           Inventory (upsert, restock, decrement)  │
//! │  customers   Customer          CustomerBook                            │
//! │  sales       Sale              SaleLedger (append only)                │
//! │  cart        CartLine          CartEngine (after every mutation)       │
//! │  groups      ProductGroup      GroupBook                               │
//! │  config      Settings (1 rec)  Settings::save                          │
//! │  users       opaque JSON       backup restore only                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Implementations
//! - [`MemoryStore`] (here): tests and ephemeral sessions
//! - `SqliteCollectionStore` (pdv-db): one row per collection

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Collection Names
// =============================================================================

/// Logical collection names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Products,
    Customers,
    Sales,
    Cart,
    Groups,
    Config,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Products,
        Collection::Customers,
        Collection::Sales,
        Collection::Cart,
        Collection::Groups,
        Collection::Config,
        Collection::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Customers => "customers",
            Collection::Sales => "sales",
            Collection::Cart => "cart",
            Collection::Groups => "groups",
            Collection::Config => "config",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Store Trait
// =============================================================================

/// Whole-collection persistence.
///
/// A missing collection loads as an empty list. Saves replace the entire
/// collection; there are no partial updates.
pub trait CollectionStore: Send + Sync {
    /// Loads every record of `collection`.
    fn load_collection(
        &self,
        collection: Collection,
    ) -> impl Future<Output = StoreResult<Vec<Value>>> + Send;

    /// Replaces `collection` with `records`.
    fn save_collection(
        &self,
        collection: Collection,
        records: Vec<Value>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Replaces several collections.
    ///
    /// The default writes them one by one. Backends with transactions
    /// override this to make the batch all-or-nothing.
    fn save_collections(
        &self,
        batch: Vec<(Collection, Vec<Value>)>,
    ) -> impl Future<Output = StoreResult<()>> + Send {
        async move {
            for (collection, records) in batch {
                self.save_collection(collection, records).await?;
            }
            Ok(())
        }
    }
}

// =============================================================================
// Typed Helpers
// =============================================================================

/// Loads a collection and decodes every record as `T`.
pub async fn load_records<S, T>(store: &S, collection: Collection) -> StoreResult<Vec<T>>
where
    S: CollectionStore,
    T: DeserializeOwned,
{
    let values = store.load_collection(collection).await?;
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(|e| corrupt(collection, e)))
        .collect()
}

/// Encodes `records` and replaces the collection with them.
pub async fn save_records<S, T>(store: &S, collection: Collection, records: &[T]) -> StoreResult<()>
where
    S: CollectionStore,
    T: Serialize,
{
    let values = encode_records(collection, records)?;
    store.save_collection(collection, values).await
}

/// Encodes records without writing them; used to build batches.
pub fn encode_records<T: Serialize>(collection: Collection, records: &[T]) -> StoreResult<Vec<Value>> {
    records
        .iter()
        .map(|record| serde_json::to_value(record).map_err(|e| corrupt(collection, e)))
        .collect()
}

fn corrupt(collection: Collection, err: serde_json::Error) -> StoreError {
    StoreError::Corrupt {
        collection: collection.as_str().to_string(),
        reason: err.to_string(),
    }
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// A [`CollectionStore`] held in process memory.
///
/// `set_fail_writes(true)` makes every save fail with
/// [`StoreError::Backend`], which lets tests observe storage failures.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, Vec<Value>>>,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent saves fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful collection writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<Collection, Vec<Value>>>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn check_writable(&self, collection: Collection) -> StoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(format!(
                "write to '{}' refused",
                collection
            )));
        }
        Ok(())
    }
}

impl CollectionStore for MemoryStore {
    async fn load_collection(&self, collection: Collection) -> StoreResult<Vec<Value>> {
        let collections = self.lock()?;
        Ok(collections.get(&collection).cloned().unwrap_or_default())
    }

    async fn save_collection(&self, collection: Collection, records: Vec<Value>) -> StoreResult<()> {
        self.check_writable(collection)?;
        let mut collections = self.lock()?;
        collections.insert(collection, records);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn save_collections(&self, batch: Vec<(Collection, Vec<Value>)>) -> StoreResult<()> {
        for (collection, _) in &batch {
            self.check_writable(*collection)?;
        }
        let mut collections = self.lock()?;
        for (collection, records) in batch {
            collections.insert(collection, records);
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
