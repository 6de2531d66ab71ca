//! Domain types shared across the Lectern services.

pub mod identity;
pub mod materials;
pub mod progress;
