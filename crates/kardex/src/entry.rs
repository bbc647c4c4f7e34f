use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use almacen_core::{IngresoId, KardexEntryId, ProductId, UserId};
use almacen_stock::{Balance, StockEvent};

/// Movement classification in the kardex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Validated receipt posted into available stock.
    IngresoValidado,
    /// Signed manual adjustment.
    AjusteManual,
    /// Quantity earmarked out of available.
    Reserva,
    /// Earmarked quantity returned to available.
    Liberacion,
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            MovementKind::IngresoValidado => "ingreso_validado",
            MovementKind::AjusteManual => "ajuste_manual",
            MovementKind::Reserva => "reserva",
            MovementKind::Liberacion => "liberacion",
        };
        f.write_str(name)
    }
}

/// One immutable movement record.
///
/// Entries are append-only: never mutated, never deleted. `record_version`
/// is the stock record's version after this movement, which makes the
/// per-product history order explicit even when entry ids from concurrent
/// writers interleave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KardexEntry {
    pub id: KardexEntryId,
    pub event_id: Uuid,
    pub product_id: ProductId,
    pub movement: MovementKind,
    pub delta: i64,
    pub balance: Balance,
    pub record_version: u64,
    pub actor_id: UserId,
    pub ingreso_id: Option<IngresoId>,
    pub motivo: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl KardexEntry {
    /// Build the entry for a ledger event, stamping identity and the
    /// post-movement record version.
    pub fn from_stock_event(
        id: KardexEntryId,
        event: &StockEvent,
        record_version: u64,
    ) -> Self {
        let (movement, ingreso_id, motivo) = match event {
            StockEvent::Adjusted(e) => (MovementKind::AjusteManual, None, Some(e.motivo.clone())),
            StockEvent::Reserved(_) => (MovementKind::Reserva, None, None),
            StockEvent::Released(_) => (MovementKind::Liberacion, None, None),
            StockEvent::Received(e) => (MovementKind::IngresoValidado, Some(e.ingreso_id), None),
        };

        Self {
            id,
            event_id: Uuid::now_v7(),
            product_id: event.product_id(),
            movement,
            delta: event.delta_available(),
            balance: event.balance(),
            record_version,
            actor_id: event.actor_id(),
            ingreso_id,
            motivo,
            occurred_at: event.occurred_at(),
        }
    }
}

/// Half-open time filter for history queries. `None` bounds are unbounded.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub desde: Option<DateTime<Utc>>,
    pub hasta: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        if let Some(desde) = self.desde {
            if at < desde {
                return false;
            }
        }
        if let Some(hasta) = self.hasta {
            if at >= hasta {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use almacen_stock::StockReceived;
    use chrono::Duration;

    #[test]
    fn receipt_event_maps_to_ingreso_validado_with_reference() {
        let event = StockEvent::Received(StockReceived {
            product_id: ProductId::new(7),
            quantity: 100,
            ingreso_id: IngresoId::new(12),
            actor_id: UserId::new(3),
            balance: Balance::new(100, 0),
            occurred_at: Utc::now(),
        });

        let entry = KardexEntry::from_stock_event(KardexEntryId::new(1), &event, 1);
        assert_eq!(entry.movement, MovementKind::IngresoValidado);
        assert_eq!(entry.delta, 100);
        assert_eq!(entry.ingreso_id, Some(IngresoId::new(12)));
        assert_eq!(entry.balance.total, 100);
        assert_eq!(entry.record_version, 1);
    }

    #[test]
    fn time_range_is_half_open() {
        let at = Utc::now();
        let range = TimeRange {
            desde: Some(at - Duration::hours(1)),
            hasta: Some(at),
        };
        assert!(range.contains(at - Duration::minutes(30)));
        assert!(!range.contains(at));
        assert!(range.contains(at - Duration::hours(1)));
        assert!(TimeRange::all().contains(at));
    }
}
