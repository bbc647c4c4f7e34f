//! The goods-receipt workflow service.
//!
//! Orchestrates the `Ingreso` aggregate against its store and posts the
//! terminal stock effect of a validation through the ledger. The state
//! transition is persisted before stock is touched, so a concurrent
//! double-validation is decided by the receipt's compare-and-swap and the
//! quantity is posted at most once. If the ledger write itself fails, the
//! receipt is restored to its pre-validation snapshot; no receipt is left
//! `Validated` without its stock posted.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use almacen_auth::{require, Actor, Module, Operation};
use almacen_catalog::ProductCatalog;
use almacen_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, ExpectedVersion, IngresoId, ProductId,
};
use almacen_ingresos::{
    CancelIngreso, Ingreso, IngresoChanges, IngresoCommand, RegisterIngreso, UpdateIngreso,
    ValidateIngreso,
};
use almacen_stock::NewBalance;

use crate::query::{IngresoFilter, Page, Pagination};
use crate::sequence::{counters, SequenceAllocator};
use crate::services::ledger::StockLedger;
use crate::store::{IngresoStore, StoreError};

const MAX_CONFLICT_ATTEMPTS: u32 = 3;

/// Registration input, one field per wire contract field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIngreso {
    pub product_id: ProductId,
    pub supplier: String,
    pub requested_quantity: i64,
    pub received_quantity: i64,
    pub unit_cost: Decimal,
    pub invoice: Option<String>,
    pub lot_serial: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub assigned_location: Option<String>,
    pub observations: Option<String>,
}

/// Outcome of a validation: the terminal receipt plus the posted balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub ingreso: Ingreso,
    pub balance: NewBalance,
}

#[derive(Clone)]
pub struct IngresoService {
    ingresos: Arc<dyn IngresoStore>,
    ledger: StockLedger,
    sequences: SequenceAllocator,
    catalog: Arc<dyn ProductCatalog>,
}

impl IngresoService {
    pub fn new(
        ingresos: Arc<dyn IngresoStore>,
        ledger: StockLedger,
        sequences: SequenceAllocator,
        catalog: Arc<dyn ProductCatalog>,
    ) -> Self {
        Self {
            ingresos,
            ledger,
            sequences,
            catalog,
        }
    }

    /// Register a new receipt in `Created` state. No stock effect.
    pub fn register(&self, actor: &Actor, input: NewIngreso) -> DomainResult<Ingreso> {
        require(actor, Module::Ingresos, Operation::Create)?;
        self.catalog.require_active(input.product_id)?;

        let ingreso_id = IngresoId::new(self.sequences.next(counters::INGRESOS)?);
        let mut ingreso = Ingreso::empty(ingreso_id);
        let event = ingreso.handle(&IngresoCommand::Register(RegisterIngreso {
            ingreso_id,
            product_id: input.product_id,
            supplier: input.supplier,
            requested_quantity: input.requested_quantity,
            received_quantity: input.received_quantity,
            unit_cost: input.unit_cost,
            invoice: input.invoice,
            lot_serial: input.lot_serial,
            expiry_date: input.expiry_date,
            assigned_location: input.assigned_location,
            observations: input.observations,
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        }))?;
        ingreso.apply(&event);

        self.ingresos
            .put(ingreso.clone(), ExpectedVersion::Exact(0))?;
        tracing::info!(
            ingreso_id = %ingreso_id,
            product_id = %ingreso.product_id(),
            actor_id = %actor.user_id,
            "ingreso registered"
        );
        Ok(ingreso)
    }

    /// Edit an open receipt; flips state to `Modified`.
    pub fn update(
        &self,
        actor: &Actor,
        ingreso_id: IngresoId,
        changes: IngresoChanges,
    ) -> DomainResult<Ingreso> {
        require(actor, Module::Ingresos, Operation::Edit)?;

        let command = IngresoCommand::Update(UpdateIngreso {
            ingreso_id,
            changes,
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        let (_, ingreso) = self.transition(ingreso_id, &command)?;
        tracing::info!(ingreso_id = %ingreso_id, actor_id = %actor.user_id, "ingreso updated");
        Ok(ingreso)
    }

    /// Accept a quantity into stock: the single irreversible transition.
    pub fn validate(
        &self,
        actor: &Actor,
        ingreso_id: IngresoId,
        validated_quantity: i64,
        final_location: impl Into<String>,
        observations: Option<String>,
    ) -> DomainResult<ValidationOutcome> {
        require(actor, Module::Ingresos, Operation::Edit)?;

        let command = IngresoCommand::Validate(ValidateIngreso {
            ingreso_id,
            validated_quantity,
            final_location: final_location.into(),
            observations,
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        let (previous, ingreso) = self.transition(ingreso_id, &command)?;

        // The Validated state is durable at this point; post the stock
        // effect. The receive command cannot fail on quantity, but the
        // ledger write can still exhaust its own conflict budget or hit an
        // unavailable backend; in that case the receipt is rolled back to
        // its pre-validation snapshot so the caller can retry with nothing
        // half-applied.
        let balance = match self.ledger.receive(
            actor.user_id,
            ingreso.product_id(),
            validated_quantity,
            ingreso_id,
        ) {
            Ok(balance) => balance,
            Err(err) => {
                self.restore_after_failed_posting(&previous, &ingreso);
                return Err(err);
            }
        };

        tracing::info!(
            ingreso_id = %ingreso_id,
            product_id = %ingreso.product_id(),
            validated_quantity,
            actor_id = %actor.user_id,
            "ingreso validated"
        );
        Ok(ValidationOutcome { ingreso, balance })
    }

    /// Cancel an open receipt. No stock effect, terminal.
    pub fn cancel(
        &self,
        actor: &Actor,
        ingreso_id: IngresoId,
        motivo: impl Into<String>,
    ) -> DomainResult<Ingreso> {
        require(actor, Module::Ingresos, Operation::Edit)?;

        let command = IngresoCommand::Cancel(CancelIngreso {
            ingreso_id,
            motivo: motivo.into(),
            actor_id: actor.user_id,
            occurred_at: Utc::now(),
        });
        let (_, ingreso) = self.transition(ingreso_id, &command)?;
        tracing::info!(ingreso_id = %ingreso_id, actor_id = %actor.user_id, "ingreso cancelled");
        Ok(ingreso)
    }

    pub fn get(&self, actor: &Actor, ingreso_id: IngresoId) -> DomainResult<Ingreso> {
        require(actor, Module::Ingresos, Operation::Read)?;
        self.ingresos.get(ingreso_id)?.ok_or(DomainError::NotFound)
    }

    /// Filtered, paginated listing ordered by id.
    pub fn list(
        &self,
        actor: &Actor,
        filter: &IngresoFilter,
        pagination: Pagination,
    ) -> DomainResult<Page<Ingreso>> {
        require(actor, Module::Ingresos, Operation::Read)?;

        let matching: Vec<Ingreso> = self
            .ingresos
            .list()?
            .into_iter()
            .filter(|ingreso| Self::matches(filter, ingreso))
            .collect();

        Ok(Page::slice(matching, pagination))
    }

    fn matches(filter: &IngresoFilter, ingreso: &Ingreso) -> bool {
        if let Some(state) = filter.state {
            if ingreso.state() != state {
                return false;
            }
        }
        if let Some(product_id) = filter.product_id {
            if ingreso.product_id() != product_id {
                return false;
            }
        }
        if let Some(desde) = filter.desde {
            if ingreso.created_at() < desde {
                return false;
            }
        }
        if let Some(hasta) = filter.hasta {
            if ingreso.created_at() >= hasta {
                return false;
            }
        }
        if let Some(needle) = &filter.search {
            let needle = needle.to_lowercase();
            let haystacks = [
                Some(ingreso.supplier()),
                ingreso.invoice(),
                ingreso.lot_serial(),
            ];
            return haystacks
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&needle));
        }
        true
    }

    /// Load → decide → compare-and-swap, with bounded retry on conflict.
    /// A loser reloads the receipt, so a transition that raced into a
    /// terminal state surfaces the aggregate's own error. Returns the
    /// snapshot the transition started from alongside the persisted result.
    fn transition(
        &self,
        ingreso_id: IngresoId,
        command: &IngresoCommand,
    ) -> DomainResult<(Ingreso, Ingreso)> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let previous = self
                .ingresos
                .get(ingreso_id)?
                .ok_or(DomainError::NotFound)?;
            let expected = ExpectedVersion::Exact(previous.version());

            let mut ingreso = previous.clone();
            let event = ingreso.handle(command)?;
            ingreso.apply(&event);

            match self.ingresos.put(ingreso.clone(), expected) {
                Ok(()) => return Ok((previous, ingreso)),
                Err(StoreError::Concurrency(msg)) if attempt < MAX_CONFLICT_ATTEMPTS => {
                    tracing::debug!(
                        ingreso_id = %ingreso_id,
                        attempt,
                        "ingreso write conflict, retrying: {msg}"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Compensation for a validation whose stock posting failed: swap the
    /// pre-validation snapshot back over the `Validated` record. Nothing
    /// else writes to a validated receipt, so the swap can only lose to the
    /// storage layer itself; if the restore fails too, the mismatch is
    /// logged and the posting error still surfaces to the caller.
    fn restore_after_failed_posting(&self, previous: &Ingreso, validated: &Ingreso) {
        let expected = ExpectedVersion::Exact(validated.version());
        if let Err(restore_err) = self.ingresos.put(previous.clone(), expected) {
            tracing::error!(
                ingreso_id = %validated.id_typed(),
                error = %restore_err,
                "could not restore receipt after failed stock posting; left validated without stock"
            );
        } else {
            tracing::warn!(
                ingreso_id = %validated.id_typed(),
                "stock posting failed, receipt restored to its pre-validation state"
            );
        }
    }
}
