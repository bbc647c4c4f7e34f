//! Service layer: permission checks, persistence and kardex recording
//! composed around the pure aggregates.

pub mod ingresos;
pub mod ledger;

pub use ingresos::{IngresoService, NewIngreso, ValidationOutcome};
pub use ledger::{StockLedger, StockOverviewRow};
