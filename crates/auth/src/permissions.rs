use serde::{Deserialize, Serialize};

/// Application module a permission applies to.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Usuarios,
    Productos,
    Stock,
    Ingresos,
    Kardex,
    Reportes,
}

impl Module {
    pub const ALL: [Module; 6] = [
        Module::Usuarios,
        Module::Productos,
        Module::Stock,
        Module::Ingresos,
        Module::Kardex,
        Module::Reportes,
    ];
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Module::Usuarios => "usuarios",
            Module::Productos => "productos",
            Module::Stock => "stock",
            Module::Ingresos => "ingresos",
            Module::Kardex => "kardex",
            Module::Reportes => "reportes",
        };
        f.write_str(name)
    }
}

/// Operation on a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    Create,
    Edit,
    Delete,
    Export,
}

/// Operations a role holds on one module.
///
/// `All` is the wildcard: policy layers can grant it without enumerating
/// every operation, mirroring the `"*"` permission in token-based setups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    All,
    Some(&'static [Operation]),
}

impl Access {
    pub fn allows(&self, operation: Operation) -> bool {
        match self {
            Access::All => true,
            Access::Some(ops) => ops.contains(&operation),
        }
    }
}
