//! Contract operations: request validation → permissioned service call →
//! response envelope.
//!
//! The surrounding application deserializes a request body into the matching
//! DTO, resolves the `Actor` from its session layer, calls one of these
//! functions and forwards the envelope (its `code` is the HTTP status).

use almacen_auth::Actor;
use almacen_core::{IngresoId, ProductId};
use almacen_infra::{IngresoService, StockLedger};

use crate::dto::{
    IngresoCancelRequest, IngresoCreateRequest, IngresoQueryRequest, IngresoResponse,
    IngresoUpdateRequest, IngresoValidateRequest, IngresoValidationResponse, KardexEntryResponse,
    KardexQueryRequest, PageResponse, StockAdjustmentRequest, StockAdjustmentResponse,
    StockQueryRequest, StockRowResponse,
};
use crate::envelope::Envelope;

/// The core services a deployment wires once and shares across requests.
#[derive(Clone)]
pub struct Core {
    pub ledger: StockLedger,
    pub ingresos: IngresoService,
}

impl Core {
    pub fn new(ledger: StockLedger, ingresos: IngresoService) -> Self {
        Self { ledger, ingresos }
    }
}

pub fn adjust_stock(
    core: &Core,
    actor: &Actor,
    request: StockAdjustmentRequest,
) -> Envelope<StockAdjustmentResponse> {
    if let Err(err) = request.validate() {
        return Envelope::error(&err);
    }
    let result = core.ledger.adjust(
        actor,
        ProductId::new(request.producto_id),
        request.cantidad_ajuste,
        request.motivo,
    );
    Envelope::from_result(result, "Stock ajustado correctamente", Into::into)
}

pub fn list_stock(
    core: &Core,
    actor: &Actor,
    request: StockQueryRequest,
) -> Envelope<PageResponse<StockRowResponse>> {
    let (filter, pagination) = match request.into_query() {
        Ok(query) => query,
        Err(err) => return Envelope::error(&err),
    };
    let result = core.ledger.overview(actor, &filter, pagination);
    Envelope::from_result(result, "Consulta de stock", |page| {
        PageResponse::from_page(page, Into::into)
    })
}

pub fn kardex_history(
    core: &Core,
    actor: &Actor,
    producto_id: u64,
    request: KardexQueryRequest,
) -> Envelope<Vec<KardexEntryResponse>> {
    let result = core
        .ledger
        .history(actor, ProductId::new(producto_id), request.into_range());
    Envelope::from_result(result, "Historial de movimientos", |entries| {
        entries.into_iter().map(Into::into).collect()
    })
}

pub fn create_ingreso(
    core: &Core,
    actor: &Actor,
    request: IngresoCreateRequest,
) -> Envelope<IngresoResponse> {
    if let Err(err) = request.validate() {
        return Envelope::error(&err);
    }
    match core.ingresos.register(actor, request.into_input()) {
        Ok(ingreso) => Envelope::created(ingreso.into(), "Ingreso registrado correctamente"),
        Err(err) => Envelope::error(&err),
    }
}

pub fn update_ingreso(
    core: &Core,
    actor: &Actor,
    ingreso_id: u64,
    request: IngresoUpdateRequest,
) -> Envelope<IngresoResponse> {
    let result = core
        .ingresos
        .update(actor, IngresoId::new(ingreso_id), request.into_changes());
    Envelope::from_result(result, "Ingreso actualizado", Into::into)
}

pub fn validate_ingreso(
    core: &Core,
    actor: &Actor,
    ingreso_id: u64,
    request: IngresoValidateRequest,
) -> Envelope<IngresoValidationResponse> {
    if let Err(err) = request.validate() {
        return Envelope::error(&err);
    }
    let result = core.ingresos.validate(
        actor,
        IngresoId::new(ingreso_id),
        request.cantidad_validada,
        request.ubicacion_final,
        request.observaciones_validacion,
    );
    Envelope::from_result(result, "Ingreso validado correctamente", |outcome| {
        IngresoValidationResponse {
            ingreso: outcome.ingreso.into(),
            stock: outcome.balance.into(),
        }
    })
}

pub fn cancel_ingreso(
    core: &Core,
    actor: &Actor,
    ingreso_id: u64,
    request: IngresoCancelRequest,
) -> Envelope<IngresoResponse> {
    if let Err(err) = request.validate() {
        return Envelope::error(&err);
    }
    let result = core
        .ingresos
        .cancel(actor, IngresoId::new(ingreso_id), request.motivo);
    Envelope::from_result(result, "Ingreso anulado", Into::into)
}

pub fn get_ingreso(core: &Core, actor: &Actor, ingreso_id: u64) -> Envelope<IngresoResponse> {
    let result = core.ingresos.get(actor, IngresoId::new(ingreso_id));
    Envelope::from_result(result, "Detalle de ingreso", Into::into)
}

pub fn list_ingresos(
    core: &Core,
    actor: &Actor,
    request: IngresoQueryRequest,
) -> Envelope<PageResponse<IngresoResponse>> {
    let (filter, pagination) = match request.into_query() {
        Ok(query) => query,
        Err(err) => return Envelope::error(&err),
    };
    let result = core.ingresos.list(actor, &filter, pagination);
    Envelope::from_result(result, "Consulta de ingresos", |page| {
        PageResponse::from_page(page, Into::into)
    })
}
