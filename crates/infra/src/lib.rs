//! Infrastructure layer: storage, sequence allocation, service orchestration.

pub mod query;
pub mod sequence;
pub mod services;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use query::{IngresoFilter, Page, Pagination, StockFilter};
pub use sequence::{counters, SequenceAllocator};
pub use services::{IngresoService, NewIngreso, StockLedger, StockOverviewRow, ValidationOutcome};
pub use store::memory::{
    InMemoryCounterStore, InMemoryIngresoStore, InMemoryKardexStore, InMemoryStockStore,
};
pub use store::{CounterStore, IngresoStore, KardexStore, StockStore, StoreError};
