//! Library surface of the Lectern server.
//!
//! The binary in `main.rs` wires configuration and the database into this
//! crate; integration tests build the same router against fake repositories.

pub mod auth;
pub mod handlers;
pub mod infra;
pub mod routes;

pub use infra::app_state::AppState;
