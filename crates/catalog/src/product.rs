use serde::{Deserialize, Serialize};

use almacen_core::{DomainError, DomainResult, ProductId};

/// Product classification used by the warehouse.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Insumo,
    Repuesto,
    Herramienta,
    Otro,
}

impl core::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            ProductKind::Insumo => "insumo",
            ProductKind::Repuesto => "repuesto",
            ProductKind::Herramienta => "herramienta",
            ProductKind::Otro => "otro",
        };
        f.write_str(name)
    }
}

/// Stock thresholds configured per product.
///
/// `critical <= min <= max` is not enforced between critical and min (a
/// product may alarm before it runs low), but every value must be
/// non-negative and min must not exceed max.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockThresholds {
    pub minimum: i64,
    pub maximum: i64,
    pub critical: i64,
}

impl StockThresholds {
    pub fn new(minimum: i64, maximum: i64, critical: i64) -> DomainResult<Self> {
        if minimum < 0 {
            return Err(DomainError::validation("stock minimum cannot be negative"));
        }
        if maximum < 0 {
            return Err(DomainError::validation("stock maximum cannot be negative"));
        }
        if critical < 0 {
            return Err(DomainError::validation("critical stock cannot be negative"));
        }
        if minimum > maximum {
            return Err(DomainError::validation(
                "stock minimum cannot exceed stock maximum",
            ));
        }
        Ok(Self {
            minimum,
            maximum,
            critical,
        })
    }
}

/// Catalog product metadata.
///
/// Owned and mutated by catalog management outside the core; the ledger only
/// reads it (unit, thresholds, active flag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub kind: ProductKind,
    pub unit: String,
    pub thresholds: StockThresholds,
    pub active: bool,
}

impl Product {
    pub fn new(
        id: ProductId,
        code: impl Into<String>,
        name: impl Into<String>,
        kind: ProductKind,
        unit: impl Into<String>,
        thresholds: StockThresholds,
    ) -> DomainResult<Self> {
        let code = code.into();
        let name = name.into();
        let unit = unit.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("product code cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if unit.trim().is_empty() {
            return Err(DomainError::validation("unit of measure cannot be empty"));
        }
        Ok(Self {
            id,
            code,
            name,
            kind,
            unit,
            thresholds,
            active: true,
        })
    }
}

/// Alert level derived from a product's quantities against its thresholds.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertLevel {
    #[serde(rename = "critico")]
    Critical,
    #[serde(rename = "bajo")]
    Low,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "sobrestock")]
    Overstock,
}

impl AlertLevel {
    /// Classify an available quantity. Critical wins over low; overstock is
    /// only reported when the maximum is configured above zero.
    pub fn classify(available: i64, thresholds: &StockThresholds) -> Self {
        if available <= thresholds.critical {
            AlertLevel::Critical
        } else if available <= thresholds.minimum {
            AlertLevel::Low
        } else if thresholds.maximum > 0 && available >= thresholds.maximum {
            AlertLevel::Overstock
        } else {
            AlertLevel::Normal
        }
    }
}
