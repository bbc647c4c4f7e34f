//! Request/response shapes for the core-facing JSON contract.
//!
//! Field names follow the wire contract of the surrounding application
//! (Spanish), while the domain layer keeps its own vocabulary; this module is
//! the translation boundary. Request validation here rejects malformed input
//! before any service call, in addition to the aggregate-level guards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use almacen_catalog::{AlertLevel, ProductKind};
use almacen_core::{DomainError, DomainResult, IngresoId, KardexEntryId, ProductId, UserId};
use almacen_infra::{IngresoFilter, NewIngreso, Page, Pagination, StockFilter, StockOverviewRow};
use almacen_ingresos::{Ingreso, IngresoChanges};
use almacen_kardex::{KardexEntry, TimeRange};
use almacen_stock::NewBalance;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct StockAdjustmentRequest {
    pub producto_id: u64,
    pub cantidad_ajuste: i64,
    pub motivo: String,
    pub ubicacion: Option<String>,
    pub lote_serie: Option<String>,
}

impl StockAdjustmentRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.cantidad_ajuste == 0 {
            return Err(DomainError::validation("cantidad_ajuste cannot be zero"));
        }
        if self.motivo.trim().is_empty() {
            return Err(DomainError::validation("motivo cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngresoCreateRequest {
    pub producto_id: u64,
    pub proveedor_ingreso: String,
    pub cantidad_solicitada: i64,
    pub cantidad_recibida: i64,
    pub costo_unitario: Decimal,
    pub factura_ingreso: Option<String>,
    pub lote_serie: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub ubicacion_asignada: Option<String>,
    pub observaciones: Option<String>,
}

impl IngresoCreateRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.proveedor_ingreso.trim().is_empty() {
            return Err(DomainError::validation("proveedor_ingreso cannot be empty"));
        }
        if self.cantidad_solicitada <= 0 {
            return Err(DomainError::validation(
                "cantidad_solicitada must be positive",
            ));
        }
        if self.cantidad_recibida <= 0 || self.cantidad_recibida > self.cantidad_solicitada {
            return Err(DomainError::validation(
                "cantidad_recibida must be positive and not exceed cantidad_solicitada",
            ));
        }
        if self.costo_unitario <= Decimal::ZERO {
            return Err(DomainError::validation("costo_unitario must be positive"));
        }
        Ok(())
    }

    pub fn into_input(self) -> NewIngreso {
        NewIngreso {
            product_id: ProductId::new(self.producto_id),
            supplier: self.proveedor_ingreso,
            requested_quantity: self.cantidad_solicitada,
            received_quantity: self.cantidad_recibida,
            unit_cost: self.costo_unitario,
            invoice: self.factura_ingreso,
            lot_serial: self.lote_serie,
            expiry_date: self.fecha_vencimiento,
            assigned_location: self.ubicacion_asignada,
            observations: self.observaciones,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngresoUpdateRequest {
    pub proveedor_ingreso: Option<String>,
    pub cantidad_solicitada: Option<i64>,
    pub cantidad_recibida: Option<i64>,
    pub costo_unitario: Option<Decimal>,
    pub factura_ingreso: Option<String>,
    pub lote_serie: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub ubicacion_asignada: Option<String>,
    pub observaciones: Option<String>,
}

impl IngresoUpdateRequest {
    pub fn into_changes(self) -> IngresoChanges {
        IngresoChanges {
            supplier: self.proveedor_ingreso,
            requested_quantity: self.cantidad_solicitada,
            received_quantity: self.cantidad_recibida,
            unit_cost: self.costo_unitario,
            invoice: self.factura_ingreso,
            lot_serial: self.lote_serie,
            expiry_date: self.fecha_vencimiento,
            assigned_location: self.ubicacion_asignada,
            observations: self.observaciones,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngresoValidateRequest {
    pub cantidad_validada: i64,
    pub ubicacion_final: String,
    pub observaciones_validacion: Option<String>,
}

impl IngresoValidateRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.cantidad_validada <= 0 {
            return Err(DomainError::validation(
                "cantidad_validada must be positive",
            ));
        }
        if self.ubicacion_final.trim().is_empty() {
            return Err(DomainError::validation("ubicacion_final cannot be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngresoCancelRequest {
    pub motivo: String,
}

impl IngresoCancelRequest {
    pub fn validate(&self) -> DomainResult<()> {
        if self.motivo.trim().is_empty() {
            return Err(DomainError::validation("motivo cannot be empty"));
        }
        Ok(())
    }
}

/// Stock overview listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StockQueryRequest {
    pub buscar: Option<String>,
    pub tipo: Option<ProductKind>,
    pub alerta: Option<AlertLevel>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl StockQueryRequest {
    pub fn into_query(self) -> DomainResult<(StockFilter, Pagination)> {
        let pagination = pagination(self.page, self.limit)?;
        Ok((
            StockFilter {
                search: self.buscar,
                kind: self.tipo,
                alert: self.alerta,
            },
            pagination,
        ))
    }
}

/// Ingreso listing query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngresoQueryRequest {
    pub buscar: Option<String>,
    pub estado: Option<almacen_ingresos::IngresoState>,
    pub producto_id: Option<u64>,
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl IngresoQueryRequest {
    pub fn into_query(self) -> DomainResult<(IngresoFilter, Pagination)> {
        let pagination = pagination(self.page, self.limit)?;
        Ok((
            IngresoFilter {
                search: self.buscar,
                state: self.estado,
                product_id: self.producto_id.map(ProductId::new),
                desde: self.desde,
                hasta: self.hasta,
            },
            pagination,
        ))
    }
}

/// Kardex history query.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KardexQueryRequest {
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

impl KardexQueryRequest {
    pub fn into_range(self) -> TimeRange {
        TimeRange {
            desde: self.desde,
            hasta: self.hasta,
        }
    }
}

fn pagination(page: Option<u32>, limit: Option<u32>) -> DomainResult<Pagination> {
    let defaults = Pagination::default();
    Pagination::new(
        page.unwrap_or(defaults.page),
        limit.unwrap_or(defaults.limit),
    )
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjustmentResponse {
    pub producto_id: ProductId,
    pub nuevo_disponible: i64,
    pub nuevo_total: i64,
}

impl From<NewBalance> for StockAdjustmentResponse {
    fn from(balance: NewBalance) -> Self {
        Self {
            producto_id: balance.product_id,
            nuevo_disponible: balance.available,
            nuevo_total: balance.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidacionResponse {
    pub cantidad_validada: i64,
    pub ubicacion_final: String,
    pub observaciones_validacion: Option<String>,
    pub validado_por: UserId,
    pub fecha_validacion: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnulacionResponse {
    pub motivo: String,
    pub anulado_por: UserId,
    pub fecha_anulacion: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngresoResponse {
    pub ingreso_id: IngresoId,
    pub producto_id: ProductId,
    pub proveedor_ingreso: String,
    pub cantidad_solicitada: i64,
    pub cantidad_recibida: i64,
    pub costo_unitario: Decimal,
    pub factura_ingreso: Option<String>,
    pub lote_serie: Option<String>,
    pub fecha_vencimiento: Option<NaiveDate>,
    pub ubicacion_asignada: Option<String>,
    pub observaciones: Option<String>,
    pub estado: almacen_ingresos::IngresoState,
    pub creado_por: UserId,
    pub fecha_creacion: DateTime<Utc>,
    pub validacion: Option<ValidacionResponse>,
    pub anulacion: Option<AnulacionResponse>,
}

impl From<Ingreso> for IngresoResponse {
    fn from(ingreso: Ingreso) -> Self {
        Self {
            ingreso_id: ingreso.id_typed(),
            producto_id: ingreso.product_id(),
            proveedor_ingreso: ingreso.supplier().to_string(),
            cantidad_solicitada: ingreso.requested_quantity(),
            cantidad_recibida: ingreso.received_quantity(),
            costo_unitario: ingreso.unit_cost(),
            factura_ingreso: ingreso.invoice().map(str::to_string),
            lote_serie: ingreso.lot_serial().map(str::to_string),
            fecha_vencimiento: ingreso.expiry_date(),
            ubicacion_asignada: ingreso.assigned_location().map(str::to_string),
            observaciones: ingreso.observations().map(str::to_string),
            estado: ingreso.state(),
            creado_por: ingreso.created_by(),
            fecha_creacion: ingreso.created_at(),
            validacion: ingreso.validation().map(|v| ValidacionResponse {
                cantidad_validada: v.validated_quantity,
                ubicacion_final: v.final_location.clone(),
                observaciones_validacion: v.observations.clone(),
                validado_por: v.validated_by,
                fecha_validacion: v.validated_at,
            }),
            anulacion: ingreso.cancellation().map(|c| AnulacionResponse {
                motivo: c.motivo.clone(),
                anulado_por: c.cancelled_by,
                fecha_anulacion: c.cancelled_at,
            }),
        }
    }
}

/// Validation returns both the terminal receipt and the posted balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngresoValidationResponse {
    pub ingreso: IngresoResponse,
    pub stock: StockAdjustmentResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaldoResponse {
    pub disponible: i64,
    pub reservado: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KardexEntryResponse {
    pub kardex_id: KardexEntryId,
    pub producto_id: ProductId,
    pub tipo_movimiento: String,
    pub cantidad: i64,
    pub saldo: SaldoResponse,
    pub usuario_id: UserId,
    pub ingreso_id: Option<IngresoId>,
    pub motivo: Option<String>,
    pub fecha: DateTime<Utc>,
}

impl From<KardexEntry> for KardexEntryResponse {
    fn from(entry: KardexEntry) -> Self {
        Self {
            kardex_id: entry.id,
            producto_id: entry.product_id,
            tipo_movimiento: entry.movement.to_string(),
            cantidad: entry.delta,
            saldo: SaldoResponse {
                disponible: entry.balance.available,
                reservado: entry.balance.reserved,
                total: entry.balance.total,
            },
            usuario_id: entry.actor_id,
            ingreso_id: entry.ingreso_id,
            motivo: entry.motivo,
            fecha: entry.occurred_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRowResponse {
    pub producto_id: ProductId,
    pub codigo: String,
    pub nombre: String,
    pub tipo: ProductKind,
    pub unidad_medida: String,
    pub disponible: i64,
    pub reservado: i64,
    pub total: i64,
    pub alerta: AlertLevel,
}

impl From<StockOverviewRow> for StockRowResponse {
    fn from(row: StockOverviewRow) -> Self {
        Self {
            producto_id: row.product.id,
            codigo: row.product.code,
            nombre: row.product.name,
            tipo: row.product.kind,
            unidad_medida: row.product.unit,
            disponible: row.balance.available,
            reservado: row.balance.reserved,
            total: row.balance.total,
            alerta: row.alert,
        }
    }
}

/// Paginated listing payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>, map: impl Fn(U) -> T) -> Self {
        Self {
            items: page.items.into_iter().map(map).collect(),
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}
