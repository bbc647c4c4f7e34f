//! `almacen-kardex` — the movement history domain.
//!
//! Every ledger mutation produces exactly one `KardexEntry`; the log is the
//! audit and reconciliation feed for the warehouse. Storage lives in
//! `almacen-infra`.

pub mod entry;

pub use entry::{KardexEntry, MovementKind, TimeRange};
