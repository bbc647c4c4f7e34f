//! `almacen-stock` — the stock ledger domain.
//!
//! Pure aggregate logic for the per-product quantity partition
//! (available / reserved / total). Persistence, kardex recording and
//! permission checks compose around it in `almacen-infra`.

pub mod record;

pub use record::{
    AdjustStock, Balance, NewBalance, ReceiveStock, ReleaseStock, ReserveStock, StockAdjusted,
    StockCommand, StockEvent, StockReceived, StockRecord, StockReleased, StockReserved,
};
