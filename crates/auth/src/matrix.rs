//! The static role → module → operation matrix.
//!
//! Built once at first use and read-only afterwards; `authorize` is a pure
//! lookup with no I/O.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::permissions::{Access, Module, Operation};
use crate::roles::Role;

use crate::permissions::Operation::{Create, Delete, Edit, Export, Read};

/// Immutable role → module → access table.
#[derive(Debug)]
pub struct PermissionMatrix {
    grants: HashMap<Role, HashMap<Module, Access>>,
}

impl PermissionMatrix {
    fn build() -> Self {
        let mut grants: HashMap<Role, HashMap<Module, Access>> = HashMap::new();

        // Administrador (0): unrestricted.
        grants.insert(
            Role::Administrador,
            Module::ALL.iter().map(|m| (*m, Access::All)).collect(),
        );

        grants.insert(
            Role::JefeAlmacen,
            HashMap::from([
                (Module::Productos, Access::Some(&[Read, Create, Edit, Export])),
                (Module::Stock, Access::Some(&[Read, Edit, Export])),
                (Module::Ingresos, Access::Some(&[Read, Create, Edit, Delete])),
                (Module::Kardex, Access::Some(&[Read, Export])),
                (Module::Reportes, Access::Some(&[Read, Export])),
            ]),
        );

        grants.insert(
            Role::Supervisor,
            HashMap::from([
                (Module::Productos, Access::Some(&[Read])),
                (Module::Stock, Access::Some(&[Read, Edit])),
                (Module::Ingresos, Access::Some(&[Read, Edit])),
                (Module::Kardex, Access::Some(&[Read, Export])),
                (Module::Reportes, Access::Some(&[Read])),
            ]),
        );

        grants.insert(
            Role::Almacenero,
            HashMap::from([
                (Module::Productos, Access::Some(&[Read])),
                (Module::Stock, Access::Some(&[Read])),
                (Module::Ingresos, Access::Some(&[Read, Create])),
                (Module::Kardex, Access::Some(&[Read])),
            ]),
        );

        grants.insert(
            Role::Comprador,
            HashMap::from([
                (Module::Productos, Access::Some(&[Read])),
                (Module::Ingresos, Access::Some(&[Read, Create])),
                (Module::Reportes, Access::Some(&[Read])),
            ]),
        );

        grants.insert(
            Role::Consulta,
            HashMap::from([
                (Module::Productos, Access::Some(&[Read])),
                (Module::Stock, Access::Some(&[Read])),
                (Module::Kardex, Access::Some(&[Read])),
                (Module::Reportes, Access::Some(&[Read])),
            ]),
        );

        Self { grants }
    }

    /// Process-wide matrix instance.
    pub fn global() -> &'static PermissionMatrix {
        static MATRIX: OnceLock<PermissionMatrix> = OnceLock::new();
        MATRIX.get_or_init(PermissionMatrix::build)
    }

    pub fn allows(&self, role: Role, module: Module, operation: Operation) -> bool {
        self.grants
            .get(&role)
            .and_then(|modules| modules.get(&module))
            .is_some_and(|access| access.allows(operation))
    }

    /// Modules a role can reach at all (any operation).
    pub fn modules_for(&self, role: Role) -> Vec<Module> {
        let mut modules: Vec<Module> = self
            .grants
            .get(&role)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        modules.sort_by_key(|m| m.to_string());
        modules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn administrador_has_every_module_and_operation() {
        let matrix = PermissionMatrix::global();
        for module in Module::ALL {
            for op in [Read, Create, Edit, Delete, Export] {
                assert!(matrix.allows(Role::Administrador, module, op));
            }
        }
    }

    #[test]
    fn only_administrador_reaches_usuarios() {
        let matrix = PermissionMatrix::global();
        for role in Role::ALL {
            let expected = role == Role::Administrador;
            assert_eq!(matrix.allows(role, Module::Usuarios, Read), expected);
        }
    }

    #[test]
    fn each_role_has_a_distinct_grant_set() {
        let matrix = PermissionMatrix::global();
        let mut profiles = Vec::new();
        for role in Role::ALL {
            let mut profile = Vec::new();
            for module in Module::ALL {
                for op in [Read, Create, Edit, Delete, Export] {
                    if matrix.allows(role, module, op) {
                        profile.push((module, op));
                    }
                }
            }
            profiles.push(profile);
        }
        for i in 0..profiles.len() {
            for j in (i + 1)..profiles.len() {
                assert_ne!(profiles[i], profiles[j], "roles {i} and {j} overlap exactly");
            }
        }
    }

    #[test]
    fn consulta_is_read_only() {
        let matrix = PermissionMatrix::global();
        for module in Module::ALL {
            for op in [Create, Edit, Delete, Export] {
                assert!(!matrix.allows(Role::Consulta, module, op));
            }
        }
    }
}
