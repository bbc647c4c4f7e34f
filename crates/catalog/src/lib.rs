//! `almacen-catalog` — product metadata boundary.
//!
//! The catalog is owned by the surrounding application; the core reads
//! product metadata (unit, thresholds, active flag) through `ProductCatalog`.

pub mod lookup;
pub mod product;

pub use lookup::{InMemoryCatalog, ProductCatalog};
pub use product::{AlertLevel, Product, ProductKind, StockThresholds};
