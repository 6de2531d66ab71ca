//! Repository traits the services depend on. Implementations are injected,
//! which keeps the services testable against fakes.

pub mod materials;
pub mod progress;

pub use materials::MaterialsRepository;
pub use progress::ProgressRepository;
