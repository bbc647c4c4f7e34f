//! The uniform response envelope.
//!
//! Every core-facing response is `{ success, message, data, code, timestamp }`;
//! the surrounding proxy forwards it verbatim, so the `code` doubles as the
//! HTTP status the transport should answer with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use almacen_core::DomainError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub code: u16,
    pub timestamp: DateTime<Utc>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: 200,
            timestamp: Utc::now(),
        }
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            code: 201,
            timestamp: Utc::now(),
        }
    }

    pub fn error(err: &DomainError) -> Self {
        Self {
            success: false,
            message: err.to_string(),
            data: None,
            code: error_code(err),
            timestamp: Utc::now(),
        }
    }

    /// Fold a service result into an envelope, mapping the payload on success.
    pub fn from_result<U>(
        result: Result<U, DomainError>,
        message: impl Into<String>,
        map: impl FnOnce(U) -> T,
    ) -> Self {
        match result {
            Ok(value) => Self::ok(map(value), message),
            Err(err) => Self::error(&err),
        }
    }
}

/// Status code for a domain failure.
///
/// `Conflict` only reaches the caller after the bounded internal retries are
/// exhausted.
pub fn error_code(err: &DomainError) -> u16 {
    match err {
        DomainError::Validation(_) => 400,
        DomainError::Unauthorized => 403,
        DomainError::NotFound => 404,
        DomainError::InvalidState(_) | DomainError::AlreadyValidated | DomainError::Conflict(_) => {
            409
        }
        DomainError::InsufficientStock { .. } | DomainError::InvalidReservation { .. } => 422,
        DomainError::Storage(_) => 500,
    }
}
