//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic business failures (validation,
/// invariants, workflow state). Infrastructure concerns surface only through
/// `Conflict` (optimistic concurrency, retried internally) and `Storage`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed or out-of-range input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested record was not found (unknown product/ingreso id).
    #[error("not found")]
    NotFound,

    /// A workflow transition was attempted from a terminal or mismatched state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A validated receipt was submitted for validation again.
    #[error("ingreso already validated")]
    AlreadyValidated,

    /// A withdrawal would drive `available` below zero.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: i64, available: i64 },

    /// A release exceeds the currently reserved quantity.
    #[error("invalid reservation: requested {requested}, reserved {reserved}")]
    InvalidReservation { requested: i64, reserved: i64 },

    /// Concurrent mutation detected (stale record version).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Authorization failure at the domain boundary.
    #[error("unauthorized")]
    Unauthorized,

    /// The storage layer was unavailable (lock poisoned, backend down).
    #[error("storage unavailable: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    pub fn insufficient_stock(requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn invalid_reservation(requested: i64, reserved: i64) -> Self {
        Self::InvalidReservation {
            requested,
            reserved,
        }
    }

    /// Whether a caller-transparent retry is appropriate for this error.
    ///
    /// Only optimistic-concurrency conflicts are retryable; every other
    /// variant is deterministic and retrying would produce the same outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
