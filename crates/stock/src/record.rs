use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use almacen_core::{
    Aggregate, AggregateRoot, DomainError, IngresoId, ProductId, UserId,
};

/// Snapshot of a product's quantity partition.
///
/// `total == available + reserved` at all times; both parts are non-negative.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub available: i64,
    pub reserved: i64,
    pub total: i64,
}

impl Balance {
    pub const ZERO: Balance = Balance {
        available: 0,
        reserved: 0,
        total: 0,
    };

    pub fn new(available: i64, reserved: i64) -> Self {
        Self {
            available,
            reserved,
            total: available + reserved,
        }
    }
}

/// Result of a stock-affecting operation, shaped for the wire contract.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBalance {
    pub product_id: ProductId,
    pub available: i64,
    pub total: i64,
}

/// Aggregate root: one stock record per product.
///
/// Created when a product is first given stock; never deleted, kept at zero
/// instead. All mutation goes through `handle`/`apply`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    product_id: ProductId,
    available: i64,
    reserved: i64,
    total: i64,
    version: u64,
}

impl StockRecord {
    /// Fresh zero record for a product that has never held stock.
    pub fn empty(product_id: ProductId) -> Self {
        Self {
            product_id,
            available: 0,
            reserved: 0,
            total: 0,
            version: 0,
        }
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    pub fn reserved(&self) -> i64 {
        self.reserved
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn balance(&self) -> Balance {
        Balance {
            available: self.available,
            reserved: self.reserved,
            total: self.total,
        }
    }

    pub fn new_balance(&self) -> NewBalance {
        NewBalance {
            product_id: self.product_id,
            available: self.available,
            total: self.total,
        }
    }
}

impl AggregateRoot for StockRecord {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.product_id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: signed manual adjustment of `available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub product_id: ProductId,
    pub delta: i64,
    pub motivo: String,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: earmark quantity, moving it from `available` to `reserved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: return earmarked quantity from `reserved` to `available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: post a validated receipt's quantity into `available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveStock {
    pub product_id: ProductId,
    pub quantity: i64,
    pub ingreso_id: IngresoId,
    pub actor_id: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    Adjust(AdjustStock),
    Reserve(ReserveStock),
    Release(ReleaseStock),
    Receive(ReceiveStock),
}

/// Event: `available` changed by a signed manual adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub product_id: ProductId,
    pub delta: i64,
    pub motivo: String,
    pub actor_id: UserId,
    pub balance: Balance,
    pub occurred_at: DateTime<Utc>,
}

/// Event: quantity moved from `available` to `reserved`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReserved {
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor_id: UserId,
    pub balance: Balance,
    pub occurred_at: DateTime<Utc>,
}

/// Event: quantity moved from `reserved` back to `available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReleased {
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor_id: UserId,
    pub balance: Balance,
    pub occurred_at: DateTime<Utc>,
}

/// Event: a validated receipt posted quantity into `available`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockReceived {
    pub product_id: ProductId,
    pub quantity: i64,
    pub ingreso_id: IngresoId,
    pub actor_id: UserId,
    pub balance: Balance,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockEvent {
    Adjusted(StockAdjusted),
    Reserved(StockReserved),
    Released(StockReleased),
    Received(StockReceived),
}

impl StockEvent {
    pub fn product_id(&self) -> ProductId {
        match self {
            StockEvent::Adjusted(e) => e.product_id,
            StockEvent::Reserved(e) => e.product_id,
            StockEvent::Released(e) => e.product_id,
            StockEvent::Received(e) => e.product_id,
        }
    }

    /// Signed change to `available` carried by this event.
    pub fn delta_available(&self) -> i64 {
        match self {
            StockEvent::Adjusted(e) => e.delta,
            StockEvent::Reserved(e) => -e.quantity,
            StockEvent::Released(e) => e.quantity,
            StockEvent::Received(e) => e.quantity,
        }
    }

    /// Balance after the movement.
    pub fn balance(&self) -> Balance {
        match self {
            StockEvent::Adjusted(e) => e.balance,
            StockEvent::Reserved(e) => e.balance,
            StockEvent::Released(e) => e.balance,
            StockEvent::Received(e) => e.balance,
        }
    }

    pub fn actor_id(&self) -> UserId {
        match self {
            StockEvent::Adjusted(e) => e.actor_id,
            StockEvent::Reserved(e) => e.actor_id,
            StockEvent::Released(e) => e.actor_id,
            StockEvent::Received(e) => e.actor_id,
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockEvent::Adjusted(e) => e.occurred_at,
            StockEvent::Reserved(e) => e.occurred_at,
            StockEvent::Released(e) => e.occurred_at,
            StockEvent::Received(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockRecord {
    type Command = StockCommand;
    type Event = StockEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        let balance = event.balance();
        self.available = balance.available;
        self.reserved = balance.reserved;
        self.total = balance.total;
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Self::Event, Self::Error> {
        match command {
            StockCommand::Adjust(cmd) => self.handle_adjust(cmd),
            StockCommand::Reserve(cmd) => self.handle_reserve(cmd),
            StockCommand::Release(cmd) => self.handle_release(cmd),
            StockCommand::Receive(cmd) => self.handle_receive(cmd),
        }
    }
}

impl StockRecord {
    fn ensure_product_id(&self, product_id: ProductId) -> Result<(), DomainError> {
        if self.product_id != product_id {
            return Err(DomainError::validation("product_id mismatch"));
        }
        Ok(())
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<StockEvent, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.delta == 0 {
            return Err(DomainError::validation("adjustment delta cannot be zero"));
        }
        if cmd.motivo.trim().is_empty() {
            return Err(DomainError::validation("motivo cannot be empty"));
        }

        let new_available = self.available + cmd.delta;
        if new_available < 0 {
            return Err(DomainError::insufficient_stock(-cmd.delta, self.available));
        }

        Ok(StockEvent::Adjusted(StockAdjusted {
            product_id: cmd.product_id,
            delta: cmd.delta,
            motivo: cmd.motivo.clone(),
            actor_id: cmd.actor_id,
            balance: Balance::new(new_available, self.reserved),
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_reserve(&self, cmd: &ReserveStock) -> Result<StockEvent, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("reserve quantity must be positive"));
        }
        if self.available < cmd.quantity {
            return Err(DomainError::insufficient_stock(cmd.quantity, self.available));
        }

        Ok(StockEvent::Reserved(StockReserved {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            actor_id: cmd.actor_id,
            balance: Balance::new(self.available - cmd.quantity, self.reserved + cmd.quantity),
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_release(&self, cmd: &ReleaseStock) -> Result<StockEvent, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("release quantity must be positive"));
        }
        if self.reserved < cmd.quantity {
            return Err(DomainError::invalid_reservation(cmd.quantity, self.reserved));
        }

        Ok(StockEvent::Released(StockReleased {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            actor_id: cmd.actor_id,
            balance: Balance::new(self.available + cmd.quantity, self.reserved - cmd.quantity),
            occurred_at: cmd.occurred_at,
        }))
    }

    fn handle_receive(&self, cmd: &ReceiveStock) -> Result<StockEvent, DomainError> {
        self.ensure_product_id(cmd.product_id)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("receive quantity must be positive"));
        }

        Ok(StockEvent::Received(StockReceived {
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            ingreso_id: cmd.ingreso_id,
            actor_id: cmd.actor_id,
            balance: Balance::new(self.available + cmd.quantity, self.reserved),
            occurred_at: cmd.occurred_at,
        }))
    }
}
