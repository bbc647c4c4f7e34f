//! The stock ledger service.
//!
//! Composes the pure `StockRecord` aggregate with the versioned store, the
//! kardex log, the sequence allocator and the permission engine. Execution
//! pipeline per operation:
//!
//! ```text
//! permission check → catalog lookup → load record → handle command
//!   → compare-and-swap persist (bounded retry on conflict) → kardex append
//! ```
//!
//! Per-product linearizability comes from the store's compare-and-swap: a
//! loser reloads and re-decides, so no update is ever lost and no
//! intermediate state is ever observable.

use std::sync::Arc;

use chrono::Utc;

use almacen_auth::{require, Actor, Module, Operation};
use almacen_catalog::{AlertLevel, Product, ProductCatalog};
use almacen_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, IngresoId,
    KardexEntryId, ProductId, UserId,
};
use almacen_kardex::{KardexEntry, TimeRange};
use almacen_stock::{
    AdjustStock, Balance, NewBalance, ReceiveStock, ReleaseStock, ReserveStock, StockCommand,
    StockRecord,
};

use crate::query::{Page, Pagination, StockFilter};
use crate::sequence::{counters, SequenceAllocator};
use crate::store::{KardexStore, StockStore, StoreError};

/// Conflict retries before surfacing `Conflict` to the caller.
const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// One row of the stock overview listing (catalog metadata joined with the
/// ledger quantities and the derived alert level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockOverviewRow {
    pub product: Product,
    pub balance: Balance,
    pub alert: AlertLevel,
}

/// Authoritative per-product quantities, with the kardex as its audit feed.
#[derive(Clone)]
pub struct StockLedger {
    stock: Arc<dyn StockStore>,
    kardex: Arc<dyn KardexStore>,
    sequences: SequenceAllocator,
    catalog: Arc<dyn ProductCatalog>,
}

impl StockLedger {
    pub fn new(
        stock: Arc<dyn StockStore>,
        kardex: Arc<dyn KardexStore>,
        sequences: SequenceAllocator,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            stock,
            kardex,
            sequences,
            catalog,
        }
    }

    /// Apply a signed manual adjustment to `available`.
    pub fn adjust(
        &self,
        actor: &Actor,
        product_id: ProductId,
        delta: i64,
        motivo: impl Into<String>,
    ) -> DomainResult<NewBalance> {
        require(actor, Module::Stock, Operation::Edit)?;
        self.catalog.require_active(product_id)?;

        let command = StockCommand::Adjust(AdjustStock {
            product_id,
            delta,
            motivo: motivo.into(),
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        let balance = self.execute(product_id, &command)?;
        tracing::info!(
            product_id = %product_id,
            delta,
            actor_id = %actor.user_id,
            available = balance.available,
            "stock adjusted"
        );
        Ok(balance)
    }

    /// Earmark quantity out of `available`.
    pub fn reserve(&self, actor: &Actor, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        require(actor, Module::Stock, Operation::Edit)?;
        self.catalog.require_active(product_id)?;

        let command = StockCommand::Reserve(ReserveStock {
            product_id,
            quantity,
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        self.execute(product_id, &command)?;
        tracing::info!(product_id = %product_id, quantity, actor_id = %actor.user_id, "stock reserved");
        Ok(())
    }

    /// Return earmarked quantity to `available`.
    pub fn release(&self, actor: &Actor, product_id: ProductId, quantity: i64) -> DomainResult<()> {
        require(actor, Module::Stock, Operation::Edit)?;
        self.catalog.require_active(product_id)?;

        let command = StockCommand::Release(ReleaseStock {
            product_id,
            quantity,
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        self.execute(product_id, &command)?;
        tracing::info!(product_id = %product_id, quantity, actor_id = %actor.user_id, "stock released");
        Ok(())
    }

    /// Post a validated receipt's quantity into `available`.
    ///
    /// This is the terminal effect of `IngresoService::validate`, which has
    /// already authorized the actor against the ingresos module; no separate
    /// stock permission applies here.
    pub fn receive(
        &self,
        actor_id: UserId,
        product_id: ProductId,
        quantity: i64,
        ingreso_id: IngresoId,
    ) -> DomainResult<NewBalance> {
        let command = StockCommand::Receive(ReceiveStock {
            product_id,
            quantity,
            ingreso_id,
            actor_id,
            occurred_at: Utc::now(),
        });
        let balance = self.execute(product_id, &command)?;
        tracing::info!(
            product_id = %product_id,
            quantity,
            ingreso_id = %ingreso_id,
            actor_id = %actor_id,
            "receipt posted to stock"
        );
        Ok(balance)
    }

    /// Current balance for one product (zero if it never held stock).
    pub fn balance(&self, actor: &Actor, product_id: ProductId) -> DomainResult<Balance> {
        require(actor, Module::Stock, Operation::Read)?;
        self.catalog
            .get(product_id)?
            .ok_or(DomainError::NotFound)?;
        let record = self.stock.get(product_id)?;
        Ok(record
            .map(|r| r.balance())
            .unwrap_or(Balance::ZERO))
    }

    /// Stock overview listing: quantities joined with catalog metadata and
    /// the derived alert level, filtered and paginated.
    pub fn overview(
        &self,
        actor: &Actor,
        filter: &StockFilter,
        pagination: Pagination,
    ) -> DomainResult<Page<StockOverviewRow>> {
        require(actor, Module::Stock, Operation::Read)?;

        let mut rows = Vec::new();
        for record in self.stock.list()? {
            // Products removed from the catalog keep their ledger record but
            // drop out of the overview.
            let Some(product) = self.catalog.get(record.product_id())? else {
                continue;
            };
            let alert = AlertLevel::classify(record.available(), &product.thresholds);

            if !filter.matches_text(&product.code, &product.name) {
                continue;
            }
            if let Some(kind) = filter.kind {
                if product.kind != kind {
                    continue;
                }
            }
            if let Some(wanted) = filter.alert {
                if alert != wanted {
                    continue;
                }
            }

            rows.push(StockOverviewRow {
                product,
                balance: record.balance(),
                alert,
            });
        }

        Ok(Page::slice(rows, pagination))
    }

    /// Per-product movement history within a time range.
    pub fn history(
        &self,
        actor: &Actor,
        product_id: ProductId,
        range: TimeRange,
    ) -> DomainResult<Vec<KardexEntry>> {
        require(actor, Module::Kardex, Operation::Read)?;
        self.catalog
            .get(product_id)?
            .ok_or(DomainError::NotFound)?;
        Ok(self.kardex.history(product_id, range)?)
    }

    /// Load → decide → compare-and-swap → kardex, with bounded retry on
    /// conflict. The ledger write and the kardex entry land together or the
    /// operation fails with no visible mutation.
    fn execute(&self, product_id: ProductId, command: &StockCommand) -> DomainResult<NewBalance> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut record = self
                .stock
                .get(product_id)?
                .unwrap_or_else(|| StockRecord::empty(product_id));
            let expected = ExpectedVersion::Exact(record.version());

            let event = record.handle(command)?;
            record.apply(&event);

            match self.stock.put(record.clone(), expected) {
                Ok(()) => {
                    let entry_id = KardexEntryId::new(self.sequences.next(counters::KARDEX)?);
                    let entry = KardexEntry::from_stock_event(entry_id, &event, record.version());
                    self.kardex.append(entry)?;
                    return Ok(record.new_balance());
                }
                Err(StoreError::Concurrency(msg)) if attempt < MAX_CONFLICT_ATTEMPTS => {
                    tracing::debug!(
                        product_id = %product_id,
                        attempt,
                        "stock write conflict, retrying: {msg}"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}
