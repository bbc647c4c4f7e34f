use serde::{Deserialize, Serialize};

use almacen_core::{DomainError, DomainResult, UserId};

use crate::matrix::PermissionMatrix;
use crate::permissions::{Module, Operation};
use crate::roles::Role;

/// A resolved acting identity for authorization and audit attribution.
///
/// Construction is decoupled from transport: the surrounding application
/// derives this from its session/token layer before calling the core.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Authorize a role for one operation on one module.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(role: Role, module: Module, operation: Operation) -> bool {
    PermissionMatrix::global().allows(role, module, operation)
}

/// `authorize`, surfaced as a domain error for the service layer.
///
/// Checked before any business logic runs; a denial leaves no trace in the
/// ledger or the kardex.
pub fn require(actor: &Actor, module: Module, operation: Operation) -> DomainResult<()> {
    if authorize(actor.role, module, operation) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %actor.user_id,
            role = %actor.role,
            module = %module,
            operation = ?operation,
            "permission denied"
        );
        Err(DomainError::Unauthorized)
    }
}
