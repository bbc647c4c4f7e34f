use serde::{Deserialize, Serialize};

use almacen_core::DomainError;

/// Role identifier used for RBAC.
///
/// The source system encodes roles as small integers (0..5); each role grants
/// a distinct subset of modules and operations. `Administrador` (0) has
/// unrestricted access.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every module and operation.
    Administrador,
    /// Runs the warehouse: products, stock, receipts, reporting.
    JefeAlmacen,
    /// Reconciles receipts (validation) and audits movements.
    Supervisor,
    /// Registers incoming goods and consults the catalog.
    Almacenero,
    /// Raises purchase-driven receipts, consults reporting.
    Comprador,
    /// Read-only reporting access.
    Consulta,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Administrador,
        Role::JefeAlmacen,
        Role::Supervisor,
        Role::Almacenero,
        Role::Comprador,
        Role::Consulta,
    ];

    /// Numeric role code as persisted by the surrounding application.
    pub fn code(self) -> u8 {
        match self {
            Role::Administrador => 0,
            Role::JefeAlmacen => 1,
            Role::Supervisor => 2,
            Role::Almacenero => 3,
            Role::Comprador => 4,
            Role::Consulta => 5,
        }
    }

    pub fn from_code(code: u8) -> Result<Self, DomainError> {
        match code {
            0 => Ok(Role::Administrador),
            1 => Ok(Role::JefeAlmacen),
            2 => Ok(Role::Supervisor),
            3 => Ok(Role::Almacenero),
            4 => Ok(Role::Comprador),
            5 => Ok(Role::Consulta),
            other => Err(DomainError::validation(format!("unknown role code: {other}"))),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Role::Administrador => "administrador",
            Role::JefeAlmacen => "jefe_almacen",
            Role::Supervisor => "supervisor",
            Role::Almacenero => "almacenero",
            Role::Comprador => "comprador",
            Role::Consulta => "consulta",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_codes_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_code(role.code()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_code_is_rejected() {
        assert!(matches!(
            Role::from_code(6),
            Err(DomainError::Validation(_))
        ));
    }
}
