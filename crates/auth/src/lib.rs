//! `almacen-auth` — the permission engine.
//!
//! Pure role → module → operation policy, decoupled from HTTP and storage.
//! Token issuance and session handling live in the surrounding application.

pub mod authorize;
pub mod matrix;
pub mod permissions;
pub mod roles;

pub use authorize::{authorize, require, Actor};
pub use matrix::PermissionMatrix;
pub use permissions::{Access, Module, Operation};
pub use roles::Role;
