//! `almacen-ingresos` — the goods-receipt workflow domain.
//!
//! Separating "received" (the physical count claimed at the dock) from
//! "validated" (the quantity actually accepted into available stock) lets a
//! supervisor reconcile discrepancies before the ledger is touched; the only
//! irreversible, stock-affecting action is validation.

pub mod ingreso;

pub use ingreso::{
    CancelIngreso, CancellationRecord, Ingreso, IngresoChanges, IngresoCommand, IngresoEvent,
    IngresoCancelled, IngresoRegistered, IngresoState, IngresoUpdated, IngresoValidated,
    RegisterIngreso, UpdateIngreso, ValidateIngreso, ValidationRecord,
};
