//! Storage traits and error model.
//!
//! These traits are the seam between the services and a backend. The
//! in-memory implementations ship with the crate; a database backend
//! implements the same contracts (per-key compare-and-swap on the versioned
//! records, append-only kardex inserts, atomic counter increments).

pub mod memory;

use thiserror::Error;

use almacen_core::{DomainError, ExpectedVersion, IngresoId, ProductId};
use almacen_ingresos::Ingreso;
use almacen_kardex::{KardexEntry, TimeRange};
use almacen_stock::StockRecord;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Version check failed on write (concurrent mutation).
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// The backend could not serve the request (lock poisoned, backend down).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<StoreError> for DomainError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Concurrency(msg) => DomainError::Conflict(msg),
            StoreError::Unavailable(msg) => DomainError::Storage(msg),
        }
    }
}

/// Versioned store for stock records, one per product id.
///
/// `put` performs a compare-and-swap: `expected` is the version the caller
/// loaded (0 for a record that does not exist yet); a mismatch returns
/// `StoreError::Concurrency` and must leave the stored record untouched.
pub trait StockStore: Send + Sync {
    fn get(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError>;

    fn put(&self, record: StockRecord, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<StockRecord>, StoreError>;
}

/// Versioned store for goods receipts. Same compare-and-swap contract as
/// `StockStore`; receipts are never removed.
pub trait IngresoStore: Send + Sync {
    fn get(&self, ingreso_id: IngresoId) -> Result<Option<Ingreso>, StoreError>;

    fn put(&self, ingreso: Ingreso, expected: ExpectedVersion) -> Result<(), StoreError>;

    fn list(&self) -> Result<Vec<Ingreso>, StoreError>;
}

/// Append-only kardex log.
pub trait KardexStore: Send + Sync {
    /// Append one entry. Fails only when the backend is unavailable.
    fn append(&self, entry: KardexEntry) -> Result<(), StoreError>;

    /// Per-product history within `range`, ordered by the stock record
    /// version each entry snapshotted (the serial movement order).
    fn history(
        &self,
        product_id: ProductId,
        range: TimeRange,
    ) -> Result<Vec<KardexEntry>, StoreError>;

    /// Number of stored entries (reporting/tests).
    fn len(&self) -> Result<usize, StoreError>;
}

/// Named monotonically increasing counters.
pub trait CounterStore: Send + Sync {
    /// Atomically increment `counter` and return the new value. The first
    /// call for a name returns 1.
    fn increment(&self, counter: &str) -> Result<u64, StoreError>;

    /// Last allocated value for `counter` (0 if never incremented).
    fn current(&self, counter: &str) -> Result<u64, StoreError>;
}
