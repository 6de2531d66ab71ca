//! Business logic over the repository ports.

pub mod materials;
pub mod progress;

pub use materials::MaterialService;
pub use progress::ProgressService;
