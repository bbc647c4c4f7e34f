//! `almacen-contracts` — the core-facing JSON contract layer.
//!
//! Transport framing and authentication are external; this crate owns the
//! request/response shapes, the uniform envelope and the glue from validated
//! requests to the permissioned services.

pub mod dto;
pub mod envelope;
pub mod handlers;

pub use envelope::{error_code, Envelope};
pub use handlers::Core;
