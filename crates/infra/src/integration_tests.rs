//! Integration tests for the full ledger + workflow pipeline.
//!
//! Tests: permission check → aggregate → versioned store → kardex log,
//! including interleaved writers against the same product and receipt.

use std::sync::{Arc, Mutex};
use std::thread;

use rust_decimal::Decimal;

use almacen_auth::{Actor, Role};
use almacen_catalog::{AlertLevel, InMemoryCatalog, Product, ProductKind, StockThresholds};
use almacen_core::{DomainError, ExpectedVersion, ProductId, UserId};
use almacen_ingresos::{IngresoChanges, IngresoState};
use almacen_kardex::{MovementKind, TimeRange};
use almacen_stock::StockRecord;

use crate::query::{IngresoFilter, Pagination, StockFilter};
use crate::sequence::{counters, SequenceAllocator};
use crate::services::{IngresoService, NewIngreso, StockLedger};
use crate::store::memory::{
    InMemoryCounterStore, InMemoryIngresoStore, InMemoryKardexStore, InMemoryStockStore,
};
use crate::store::{KardexStore, StockStore, StoreError};

struct Harness {
    ledger: StockLedger,
    ingresos: IngresoService,
    kardex: Arc<InMemoryKardexStore>,
    sequences: SequenceAllocator,
    catalog: Arc<InMemoryCatalog>,
}

fn harness() -> Harness {
    let stock = Arc::new(InMemoryStockStore::new());
    let kardex = Arc::new(InMemoryKardexStore::new());
    let counters_store = Arc::new(InMemoryCounterStore::new());
    let sequences = SequenceAllocator::new(counters_store);

    let catalog = Arc::new(InMemoryCatalog::seed([
        Product::new(
            ProductId::new(7),
            "P-0007",
            "Filtro de aceite",
            ProductKind::Repuesto,
            "unidad",
            StockThresholds::new(10, 500, 3).unwrap(),
        )
        .unwrap(),
        Product::new(
            ProductId::new(8),
            "P-0008",
            "Guantes de nitrilo",
            ProductKind::Insumo,
            "par",
            StockThresholds::new(20, 200, 5).unwrap(),
        )
        .unwrap(),
    ]));

    let ledger = StockLedger::new(
        stock,
        kardex.clone(),
        sequences.clone(),
        catalog.clone() as Arc<dyn almacen_catalog::ProductCatalog>,
    );
    let ingresos = IngresoService::new(
        Arc::new(InMemoryIngresoStore::new()),
        ledger.clone(),
        sequences.clone(),
        catalog.clone() as Arc<dyn almacen_catalog::ProductCatalog>,
    );

    Harness {
        ledger,
        ingresos,
        kardex,
        sequences,
        catalog,
    }
}

fn admin() -> Actor {
    Actor::new(UserId::new(1), Role::Administrador)
}

fn supervisor() -> Actor {
    Actor::new(UserId::new(9), Role::Supervisor)
}

fn new_ingreso(product: u64, requested: i64, received: i64) -> NewIngreso {
    NewIngreso {
        product_id: ProductId::new(product),
        supplier: "Proveedora Andina SAC".to_string(),
        requested_quantity: requested,
        received_quantity: received,
        unit_cost: Decimal::new(50, 1),
        invoice: Some("F001-2301".to_string()),
        lot_serial: None,
        expiry_date: None,
        assigned_location: Some("RECEPCION".to_string()),
        observations: None,
    }
}

#[test]
fn validated_ingreso_posts_stock_and_one_kardex_entry() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    assert_eq!(ingreso.state(), IngresoState::Created);

    let outcome = h
        .ingresos
        .validate(&supervisor(), ingreso.id_typed(), 100, "A1", None)
        .unwrap();
    assert_eq!(outcome.ingreso.state(), IngresoState::Validated);
    assert_eq!(outcome.balance.available, 100);
    assert_eq!(outcome.balance.total, 100);

    let history = h
        .ledger
        .history(&actor, ProductId::new(7), TimeRange::all())
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].movement, MovementKind::IngresoValidado);
    assert_eq!(history[0].delta, 100);
    assert_eq!(history[0].ingreso_id, Some(ingreso.id_typed()));
}

#[test]
fn cancelled_ingreso_leaves_stock_and_kardex_untouched() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 50, 50)).unwrap();
    let cancelled = h
        .ingresos
        .cancel(&actor, ingreso.id_typed(), "mercaderia dañada")
        .unwrap();
    assert_eq!(cancelled.state(), IngresoState::Cancelled);
    assert_eq!(cancelled.cancellation().unwrap().motivo, "mercaderia dañada");

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().total, 0);
    assert_eq!(h.kardex.len().unwrap(), 0);
}

#[test]
fn second_validation_fails_and_posts_nothing() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    h.ingresos
        .validate(&actor, ingreso.id_typed(), 100, "A1", None)
        .unwrap();

    let err = h
        .ingresos
        .validate(&actor, ingreso.id_typed(), 100, "A1", None)
        .unwrap_err();
    assert_eq!(err, DomainError::AlreadyValidated);

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().available, 100);
    assert_eq!(h.kardex.len().unwrap(), 1);
}

#[test]
fn cancel_after_validation_is_rejected() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    h.ingresos
        .validate(&actor, ingreso.id_typed(), 60, "A1", None)
        .unwrap();

    let err = h
        .ingresos
        .cancel(&actor, ingreso.id_typed(), "tarde")
        .unwrap_err();
    assert!(matches!(err, DomainError::InvalidState(_)));
}

#[test]
fn validation_above_received_is_rejected_before_any_mutation() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    let err = h
        .ingresos
        .validate(&actor, ingreso.id_typed(), 101, "A1", None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().total, 0);
    assert_eq!(h.kardex.len().unwrap(), 0);
    assert_eq!(
        h.ingresos.get(&actor, ingreso.id_typed()).unwrap().state(),
        IngresoState::Created
    );
}

#[test]
fn updated_ingreso_stays_eligible_and_validates_against_edited_quantity() {
    let h = harness();
    let actor = admin();

    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    let updated = h
        .ingresos
        .update(
            &actor,
            ingreso.id_typed(),
            IngresoChanges {
                received_quantity: Some(80),
                ..IngresoChanges::default()
            },
        )
        .unwrap();
    assert_eq!(updated.state(), IngresoState::Modified);

    let err = h
        .ingresos
        .validate(&actor, ingreso.id_typed(), 81, "A1", None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    let outcome = h
        .ingresos
        .validate(&actor, ingreso.id_typed(), 80, "A1", None)
        .unwrap();
    assert_eq!(outcome.balance.available, 80);
}

#[test]
fn adjust_into_negative_fails_and_leaves_state_unchanged() {
    let h = harness();
    let actor = admin();

    h.ledger
        .adjust(&actor, ProductId::new(7), 100, "recuento inicial")
        .unwrap();

    let err = h
        .ledger
        .adjust(&actor, ProductId::new(7), -150, "merma")
        .unwrap_err();
    assert_eq!(
        err,
        DomainError::InsufficientStock {
            requested: 150,
            available: 100
        }
    );

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().available, 100);
    // Only the seed adjustment reached the kardex.
    assert_eq!(h.kardex.len().unwrap(), 1);
}

#[test]
fn reserve_and_release_emit_kardex_movements_and_keep_total() {
    let h = harness();
    let actor = admin();

    h.ledger.adjust(&actor, ProductId::new(7), 10, "seed").unwrap();
    h.ledger.reserve(&actor, ProductId::new(7), 4).unwrap();

    let balance = h.ledger.balance(&actor, ProductId::new(7)).unwrap();
    assert_eq!(balance.available, 6);
    assert_eq!(balance.reserved, 4);
    assert_eq!(balance.total, 10);

    let err = h.ledger.release(&actor, ProductId::new(7), 5).unwrap_err();
    assert!(matches!(err, DomainError::InvalidReservation { .. }));

    h.ledger.release(&actor, ProductId::new(7), 4).unwrap();
    let history = h
        .ledger
        .history(&actor, ProductId::new(7), TimeRange::all())
        .unwrap();
    let kinds: Vec<MovementKind> = history.iter().map(|e| e.movement).collect();
    assert_eq!(
        kinds,
        vec![
            MovementKind::AjusteManual,
            MovementKind::Reserva,
            MovementKind::Liberacion
        ]
    );
    assert_eq!(history[2].balance.total, 10);
}

#[test]
fn unknown_product_is_rejected_before_any_mutation() {
    let h = harness();
    let err = h
        .ledger
        .adjust(&admin(), ProductId::new(999), 10, "recuento")
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);
    assert_eq!(h.kardex.len().unwrap(), 0);
}

#[test]
fn denied_role_gets_unauthorized_before_any_business_logic() {
    let h = harness();
    let consulta = Actor::new(UserId::new(44), Role::Consulta);

    let err = h
        .ledger
        .adjust(&consulta, ProductId::new(7), 10, "recuento")
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthorized);

    let err = h
        .ingresos
        .register(&consulta, new_ingreso(7, 10, 10))
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthorized);

    assert_eq!(h.kardex.len().unwrap(), 0);
    // Consulta can still read.
    assert!(h.ledger.balance(&consulta, ProductId::new(7)).is_ok());
}

#[test]
fn concurrent_adjustments_serialize_without_lost_updates() {
    let h = harness();
    let actor = admin();
    h.ledger
        .adjust(&actor, ProductId::new(7), 1_000, "seed")
        .unwrap();

    let threads = 8;
    let per_thread = 25;
    let mut handles = Vec::new();
    for t in 0..threads {
        let ledger = h.ledger.clone();
        handles.push(thread::spawn(move || {
            let actor = Actor::new(UserId::new(100 + t as u64), Role::JefeAlmacen);
            for _ in 0..per_thread {
                // +3 and -1 per iteration; never enough to go negative.
                ledger.adjust(&actor, ProductId::new(7), 3, "conteo").unwrap();
                ledger.adjust(&actor, ProductId::new(7), -1, "merma").unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let expected = 1_000 + threads as i64 * per_thread as i64 * 2;
    let balance = h.ledger.balance(&actor, ProductId::new(7)).unwrap();
    assert_eq!(balance.available, expected);
    assert_eq!(balance.total, expected);

    // Exactly one kardex entry per successful mutation, in serial order.
    let history = h
        .ledger
        .history(&actor, ProductId::new(7), TimeRange::all())
        .unwrap();
    assert_eq!(history.len(), 1 + threads * per_thread * 2);
    for (idx, entry) in history.iter().enumerate() {
        assert_eq!(entry.record_version, idx as u64 + 1);
        assert_eq!(entry.balance.total, entry.balance.available + entry.balance.reserved);
    }
}

#[test]
fn concurrent_operations_on_distinct_products_do_not_interfere() {
    let h = harness();
    let actor = admin();

    let ledger_a = h.ledger.clone();
    let ledger_b = h.ledger.clone();
    let a = thread::spawn(move || {
        let actor = admin();
        for _ in 0..200 {
            ledger_a.adjust(&actor, ProductId::new(7), 1, "conteo").unwrap();
        }
    });
    let b = thread::spawn(move || {
        let actor = admin();
        for _ in 0..200 {
            ledger_b.adjust(&actor, ProductId::new(8), 2, "conteo").unwrap();
        }
    });
    a.join().unwrap();
    b.join().unwrap();

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().available, 200);
    assert_eq!(h.ledger.balance(&actor, ProductId::new(8)).unwrap().available, 400);
}

#[test]
fn concurrent_double_validation_posts_stock_exactly_once() {
    let h = harness();
    let actor = admin();
    let ingreso = h.ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();
    let id = ingreso.id_typed();

    let mut handles = Vec::new();
    for t in 0..4u64 {
        let ingresos = h.ingresos.clone();
        handles.push(thread::spawn(move || {
            let actor = Actor::new(UserId::new(200 + t), Role::Supervisor);
            ingresos.validate(&actor, id, 100, "A1", None)
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for failure in results.iter().filter(|r| r.is_err()) {
        assert_eq!(failure.as_ref().unwrap_err(), &DomainError::AlreadyValidated);
    }

    assert_eq!(h.ledger.balance(&actor, ProductId::new(7)).unwrap().available, 100);
    assert_eq!(h.kardex.len().unwrap(), 1);
}

/// Stock store that fails its next `failures` writes with a concurrency
/// error, then behaves normally.
struct FlakyStockStore {
    inner: InMemoryStockStore,
    failures: Mutex<u32>,
}

impl FlakyStockStore {
    fn failing(failures: u32) -> Self {
        Self {
            inner: InMemoryStockStore::new(),
            failures: Mutex::new(failures),
        }
    }
}

impl StockStore for FlakyStockStore {
    fn get(&self, product_id: ProductId) -> Result<Option<StockRecord>, StoreError> {
        self.inner.get(product_id)
    }

    fn put(&self, record: StockRecord, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut left = self.failures.lock().unwrap();
        if *left > 0 {
            *left -= 1;
            return Err(StoreError::Concurrency("injected write conflict".to_string()));
        }
        self.inner.put(record, expected)
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        self.inner.list()
    }
}

#[test]
fn failed_stock_posting_rolls_the_validation_back() {
    // Enough injected conflicts to exhaust the ledger's retry budget once.
    let stock = Arc::new(FlakyStockStore::failing(3));
    let kardex = Arc::new(InMemoryKardexStore::new());
    let sequences = SequenceAllocator::new(Arc::new(InMemoryCounterStore::new()));
    let catalog = Arc::new(InMemoryCatalog::seed([Product::new(
        ProductId::new(7),
        "P-0007",
        "Filtro de aceite",
        ProductKind::Repuesto,
        "unidad",
        StockThresholds::new(10, 500, 3).unwrap(),
    )
    .unwrap()]));
    let ledger = StockLedger::new(
        stock,
        kardex.clone(),
        sequences.clone(),
        catalog.clone() as Arc<dyn almacen_catalog::ProductCatalog>,
    );
    let ingresos = IngresoService::new(
        Arc::new(InMemoryIngresoStore::new()),
        ledger.clone(),
        sequences,
        catalog as Arc<dyn almacen_catalog::ProductCatalog>,
    );

    let actor = admin();
    let ingreso = ingresos.register(&actor, new_ingreso(7, 100, 100)).unwrap();

    let err = ingresos
        .validate(&actor, ingreso.id_typed(), 100, "A1", None)
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Nothing half-applied: the receipt is back to Created, no stock was
    // posted, no kardex entry exists.
    assert_eq!(
        ingresos.get(&actor, ingreso.id_typed()).unwrap().state(),
        IngresoState::Created
    );
    assert_eq!(ledger.balance(&actor, ProductId::new(7)).unwrap().total, 0);
    assert_eq!(kardex.len().unwrap(), 0);

    // The store is healthy again; a retried validation goes through.
    let outcome = ingresos
        .validate(&actor, ingreso.id_typed(), 100, "A1", None)
        .unwrap();
    assert_eq!(outcome.ingreso.state(), IngresoState::Validated);
    assert_eq!(outcome.balance.available, 100);
    assert_eq!(kardex.len().unwrap(), 1);
}

#[test]
fn sequence_allocator_under_contention_yields_distinct_dense_values() {
    let h = harness();

    let threads = 8;
    let per_thread = 125;
    let mut handles = Vec::new();
    for _ in 0..threads {
        let sequences = h.sequences.clone();
        handles.push(thread::spawn(move || {
            let mut values = Vec::with_capacity(per_thread);
            for _ in 0..per_thread {
                values.push(sequences.next(counters::PRODUCTOS).unwrap());
            }
            values
        }));
    }

    let mut all: Vec<u64> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();
    all.sort_unstable();

    let expected: Vec<u64> = (1..=(threads * per_thread) as u64).collect();
    assert_eq!(all, expected);
}

#[test]
fn stock_overview_filters_and_paginates() {
    let h = harness();
    let actor = admin();

    h.ledger.adjust(&actor, ProductId::new(7), 2, "seed").unwrap(); // critical (<= 3)
    h.ledger.adjust(&actor, ProductId::new(8), 100, "seed").unwrap(); // normal

    let all = h
        .ledger
        .overview(&actor, &StockFilter::default(), Pagination::default())
        .unwrap();
    assert_eq!(all.total, 2);

    let critical = h
        .ledger
        .overview(
            &actor,
            &StockFilter {
                alert: Some(AlertLevel::Critical),
                ..StockFilter::default()
            },
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(critical.total, 1);
    assert_eq!(critical.items[0].product.id, ProductId::new(7));

    let by_text = h
        .ledger
        .overview(
            &actor,
            &StockFilter {
                search: Some("guantes".to_string()),
                ..StockFilter::default()
            },
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(by_text.total, 1);
    assert_eq!(by_text.items[0].product.id, ProductId::new(8));
}

#[test]
fn ingreso_listing_filters_by_state_and_pages() {
    let h = harness();
    let actor = admin();

    for _ in 0..3 {
        h.ingresos.register(&actor, new_ingreso(7, 10, 10)).unwrap();
    }
    let cancelled = h.ingresos.register(&actor, new_ingreso(8, 5, 5)).unwrap();
    h.ingresos
        .cancel(&actor, cancelled.id_typed(), "duplicado")
        .unwrap();

    let created = h
        .ingresos
        .list(
            &actor,
            &IngresoFilter {
                state: Some(IngresoState::Created),
                ..IngresoFilter::default()
            },
            Pagination { page: 1, limit: 2 },
        )
        .unwrap();
    assert_eq!(created.total, 3);
    assert_eq!(created.total_pages, 2);
    assert_eq!(created.items.len(), 2);

    let by_supplier = h
        .ingresos
        .list(
            &actor,
            &IngresoFilter {
                search: Some("andina".to_string()),
                ..IngresoFilter::default()
            },
            Pagination::default(),
        )
        .unwrap();
    assert_eq!(by_supplier.total, 4);
}

#[test]
fn inactive_product_rejects_new_receipts_but_keeps_its_record() {
    let h = harness();
    let actor = admin();

    h.ledger.adjust(&actor, ProductId::new(8), 30, "seed").unwrap();

    let mut inactive = Product::new(
        ProductId::new(8),
        "P-0008",
        "Guantes de nitrilo",
        ProductKind::Insumo,
        "par",
        StockThresholds::new(20, 200, 5).unwrap(),
    )
    .unwrap();
    inactive.active = false;
    h.catalog.upsert(inactive);

    let err = h
        .ingresos
        .register(&actor, new_ingreso(8, 10, 10))
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));

    // The ledger record survives deactivation.
    assert_eq!(h.ledger.balance(&actor, ProductId::new(8)).unwrap().total, 30);
}
