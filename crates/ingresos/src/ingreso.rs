use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use almacen_core::{Aggregate, AggregateRoot, DomainError, IngresoId, ProductId, UserId};

/// Goods-receipt lifecycle.
///
/// The source system stores this as a small integer (0..3); here it is a
/// closed enum so illegal transitions are unrepresentable. `Modified` is an
/// audit marker: an edited receipt stays eligible for validation and
/// cancellation exactly as if it were still `Created`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngresoState {
    #[serde(rename = "creado")]
    Created,
    #[serde(rename = "validado")]
    Validated,
    #[serde(rename = "anulado")]
    Cancelled,
    #[serde(rename = "modificado")]
    Modified,
}

impl IngresoState {
    /// Still editable / validatable / cancellable.
    pub fn is_open(self) -> bool {
        matches!(self, IngresoState::Created | IngresoState::Modified)
    }

    pub fn is_terminal(self) -> bool {
        !self.is_open()
    }
}

impl core::fmt::Display for IngresoState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            IngresoState::Created => "creado",
            IngresoState::Validated => "validado",
            IngresoState::Cancelled => "anulado",
            IngresoState::Modified => "modificado",
        };
        f.write_str(name)
    }
}

/// Supervisor sign-off recorded at validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    pub validated_quantity: i64,
    pub final_location: String,
    pub observations: Option<String>,
    pub validated_by: UserId,
    pub validated_at: DateTime<Utc>,
}

/// Cancellation audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationRecord {
    pub motivo: String,
    pub cancelled_by: UserId,
    pub cancelled_at: DateTime<Utc>,
}

/// Editable receipt fields; `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoChanges {
    pub supplier: Option<String>,
    pub requested_quantity: Option<i64>,
    pub received_quantity: Option<i64>,
    pub unit_cost: Option<Decimal>,
    pub invoice: Option<String>,
    pub lot_serial: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub assigned_location: Option<String>,
    pub observations: Option<String>,
}

impl IngresoChanges {
    pub fn is_empty(&self) -> bool {
        self == &IngresoChanges::default()
    }
}

/// Aggregate root: one goods receipt from registration to validation or
/// cancellation. Never physically deleted once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingreso {
    id: IngresoId,
    product_id: ProductId,
    supplier: String,
    requested_quantity: i64,
    received_quantity: i64,
    unit_cost: Decimal,
    invoice: Option<String>,
    lot_serial: Option<String>,
    expiry_date: Option<NaiveDate>,
    assigned_location: Option<String>,
    observations: Option<String>,
    state: IngresoState,
    created_by: UserId,
    created_at: DateTime<Utc>,
    validation: Option<ValidationRecord>,
    cancellation: Option<CancellationRecord>,
    version: u64,
    registered: bool,
}

impl Ingreso {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: IngresoId) -> Self {
        Self {
            id,
            product_id: ProductId::new(0),
            supplier: String::new(),
            requested_quantity: 0,
            received_quantity: 0,
            unit_cost: Decimal::ZERO,
            invoice: None,
            lot_serial: None,
            expiry_date: None,
            assigned_location: None,
            observations: None,
            state: IngresoState::Created,
            created_by: UserId::new(0),
            created_at: DateTime::<Utc>::MIN_UTC,
            validation: None,
            cancellation: None,
            version: 0,
            registered: false,
        }
    }

    pub fn id_typed(&self) -> IngresoId {
        self.id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    pub fn requested_quantity(&self) -> i64 {
        self.requested_quantity
    }

    pub fn received_quantity(&self) -> i64 {
        self.received_quantity
    }

    pub fn unit_cost(&self) -> Decimal {
        self.unit_cost
    }

    pub fn invoice(&self) -> Option<&str> {
        self.invoice.as_deref()
    }

    pub fn lot_serial(&self) -> Option<&str> {
        self.lot_serial.as_deref()
    }

    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.expiry_date
    }

    pub fn assigned_location(&self) -> Option<&str> {
        self.assigned_location.as_deref()
    }

    pub fn observations(&self) -> Option<&str> {
        self.observations.as_deref()
    }

    pub fn state(&self) -> IngresoState {
        self.state
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn validation(&self) -> Option<&ValidationRecord> {
        self.validation.as_ref()
    }

    pub fn cancellation(&self) -> Option<&CancellationRecord> {
        self.cancellation.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }
}

impl AggregateRoot for Ingreso {
    type Id = IngresoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterIngreso.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterIngreso {
    pub ingreso_id: IngresoId,
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
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateIngreso (field edits while the receipt is open).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateIngreso {
    pub ingreso_id: IngresoId,
    pub changes: IngresoChanges,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ValidateIngreso (the single irreversible, stock-affecting step).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateIngreso {
    pub ingreso_id: IngresoId,
    pub validated_quantity: i64,
    pub final_location: String,
    pub observations: Option<String>,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelIngreso.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelIngreso {
    pub ingreso_id: IngresoId,
    pub motivo: String,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngresoCommand {
    Register(RegisterIngreso),
    Update(UpdateIngreso),
    Validate(ValidateIngreso),
    Cancel(CancelIngreso),
}

/// Event: IngresoRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoRegistered {
    pub ingreso_id: IngresoId,
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
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: IngresoUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoUpdated {
    pub ingreso_id: IngresoId,
    pub changes: IngresoChanges,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: IngresoValidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoValidated {
    pub ingreso_id: IngresoId,
    pub product_id: ProductId,
    pub validated_quantity: i64,
    pub final_location: String,
    pub observations: Option<String>,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: IngresoCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngresoCancelled {
    pub ingreso_id: IngresoId,
    pub motivo: String,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngresoEvent {
    Registered(IngresoRegistered),
    Updated(IngresoUpdated),
    Validated(IngresoValidated),
    Cancelled(IngresoCancelled),
}

impl Aggregate for Ingreso {
    type Command = IngresoCommand;
    type Event = IngresoEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            IngresoEvent::Registered(e) => {
                self.id = e.ingreso_id;
                self.product_id = e.product_id;
                self.supplier = e.supplier.clone();
                self.requested_quantity = e.requested_quantity;
                self.received_quantity = e.received_quantity;
                self.unit_cost = e.unit_cost;
                self.invoice = e.invoice.clone();
                self.lot_serial = e.lot_serial.clone();
                self.expiry_date = e.expiry_date;
                self.assigned_location = e.assigned_location.clone();
                self.observations = e.observations.clone();
                self.state = IngresoState::Created;
                self.created_by = e.actor_id;
                self.created_at = e.occurred_at;
                self.registered = true;
            }
            IngresoEvent::Updated(e) => {
                let c = &e.changes;
                if let Some(supplier) = &c.supplier {
                    self.supplier = supplier.clone();
                }
                if let Some(requested) = c.requested_quantity {
                    self.requested_quantity = requested;
                }
                if let Some(received) = c.received_quantity {
                    self.received_quantity = received;
                }
                if let Some(cost) = c.unit_cost {
                    self.unit_cost = cost;
                }
                if let Some(invoice) = &c.invoice {
                    self.invoice = Some(invoice.clone());
                }
                if let Some(lot) = &c.lot_serial {
                    self.lot_serial = Some(lot.clone());
                }
                if let Some(expiry) = c.expiry_date {
                    self.expiry_date = Some(expiry);
                }
                if let Some(location) = &c.assigned_location {
                    self.assigned_location = Some(location.clone());
                }
                if let Some(obs) = &c.observations {
                    self.observations = Some(obs.clone());
                }
                self.state = IngresoState::Modified;
            }
            IngresoEvent::Validated(e) => {
                self.state = IngresoState::Validated;
                self.validation = Some(ValidationRecord {
                    validated_quantity: e.validated_quantity,
                    final_location: e.final_location.clone(),
                    observations: e.observations.clone(),
                    validated_by: e.actor_id,
                    validated_at: e.occurred_at,
                });
            }
            IngresoEvent::Cancelled(e) => {
                self.state = IngresoState::Cancelled;
                self.cancellation = Some(CancellationRecord {
                    motivo: e.motivo.clone(),
                    cancelled_by: e.actor_id,
                    cancelled_at: e.occurred_at,
                });
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Self::Event, Self::Error> {
        match command {
            IngresoCommand::Register(cmd) => self.handle_register(cmd),
            IngresoCommand::Update(cmd) => self.handle_update(cmd),
            IngresoCommand::Validate(cmd) => self.handle_validate(cmd),
            IngresoCommand::Cancel(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl Ingreso {
    fn ensure_ingreso_id(&self, ingreso_id: IngresoId) -> Result<(), DomainError> {
        if self.id != ingreso_id {
            return Err(DomainError::validation("ingreso_id mismatch"));
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if !self.registered {
            return Err(DomainError::not_found());
        }
        match self.state {
            IngresoState::Created | IngresoState::Modified => Ok(()),
            IngresoState::Validated => Err(DomainError::invalid_state(
                "ingreso is validated and terminal",
            )),
            IngresoState::Cancelled => Err(DomainError::invalid_state(
                "ingreso is cancelled and terminal",
            )),
        }
    }

    fn validate_quantities(
        requested: i64,
        received: i64,
        unit_cost: Decimal,
    ) -> Result<(), DomainError> {
        if requested <= 0 {
            return Err(DomainError::validation(
                "cantidad_solicitada must be positive",
            ));
        }
        if received <= 0 {
            return Err(DomainError::validation(
                "cantidad_recibida must be positive",
            ));
        }
        if received > requested {
            return Err(DomainError::validation(
                "cantidad_recibida cannot exceed cantidad_solicitada",
            ));
        }
        if unit_cost <= Decimal::ZERO {
            return Err(DomainError::validation("costo_unitario must be positive"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterIngreso) -> Result<IngresoEvent, DomainError> {
        if self.registered {
            return Err(DomainError::invalid_state("ingreso already registered"));
        }
        self.ensure_ingreso_id(cmd.ingreso_id)?;

        if cmd.supplier.trim().is_empty() {
            return Err(DomainError::validation("proveedor cannot be empty"));
        }
        Self::validate_quantities(cmd.requested_quantity, cmd.received_quantity, cmd.unit_cost)?;

        Ok(IngresoEvent::Registered(IngresoRegistered {
            ingreso_id: cmd.ingreso_id,
            product_id: cmd.product_id,
            supplier: cmd.supplier.clone(),
            requested_quantity: cmd.requested_quantity,
            received_quantity: cmd.received_quantity,
            unit_cost: cmd.unit_cost,
            invoice: cmd.invoice.clone(),
            lot_serial: cmd.lot_serial.clone(),
            expiry_date: cmd.expiry_date,
            assigned_location: cmd.assigned_location.clone(),
            observations: cmd.observations.clone(),
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_update(&self, cmd: &UpdateIngreso) -> Result<IngresoEvent, DomainError> {
        if !self.registered {
            return Err(DomainError::not_found());
        }
        self.ensure_ingreso_id(cmd.ingreso_id)?;
        self.ensure_open()?;

        if cmd.changes.is_empty() {
            return Err(DomainError::validation("no fields to update"));
        }
        if let Some(supplier) = &cmd.changes.supplier {
            if supplier.trim().is_empty() {
                return Err(DomainError::validation("proveedor cannot be empty"));
            }
        }

        // Quantities are validated against the values the edit would leave.
        let requested = cmd
            .changes
            .requested_quantity
            .unwrap_or(self.requested_quantity);
        let received = cmd
            .changes
            .received_quantity
            .unwrap_or(self.received_quantity);
        let unit_cost = cmd.changes.unit_cost.unwrap_or(self.unit_cost);
        Self::validate_quantities(requested, received, unit_cost)?;

        Ok(IngresoEvent::Updated(IngresoUpdated {
            ingreso_id: cmd.ingreso_id,
            changes: cmd.changes.clone(),
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_validate(&self, cmd: &ValidateIngreso) -> Result<IngresoEvent, DomainError> {
        if !self.registered {
            return Err(DomainError::not_found());
        }
        self.ensure_ingreso_id(cmd.ingreso_id)?;

        match self.state {
            IngresoState::Validated => return Err(DomainError::AlreadyValidated),
            IngresoState::Cancelled => {
                return Err(DomainError::invalid_state(
                    "cancelled ingreso cannot be validated",
                ));
            }
            IngresoState::Created | IngresoState::Modified => {}
        }

        if cmd.validated_quantity <= 0 {
            return Err(DomainError::validation(
                "cantidad_validada must be positive",
            ));
        }
        if cmd.validated_quantity > self.received_quantity {
            return Err(DomainError::validation(
                "cantidad_validada cannot exceed cantidad_recibida",
            ));
        }
        if cmd.final_location.trim().is_empty() {
            return Err(DomainError::validation("ubicacion_final cannot be empty"));
        }

        Ok(IngresoEvent::Validated(IngresoValidated {
            ingreso_id: cmd.ingreso_id,
            product_id: self.product_id,
            validated_quantity: cmd.validated_quantity,
            final_location: cmd.final_location.clone(),
            observations: cmd.observations.clone(),
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_cancel(&self, cmd: &CancelIngreso) -> Result<IngresoEvent, DomainError> {
        if !self.registered {
            return Err(DomainError::not_found());
        }
        self.ensure_ingreso_id(cmd.ingreso_id)?;
        self.ensure_open()?;

        if cmd.motivo.trim().is_empty() {
            return Err(DomainError::validation("motivo cannot be empty"));
        }

        Ok(IngresoEvent::Cancelled(IngresoCancelled {
            ingreso_id: cmd.ingreso_id,
            motivo: cmd.motivo.clone(),
            actor_id: cmd.actor_id,
            occurred_at: cmd.occurred_at,
        }))
    }
}
