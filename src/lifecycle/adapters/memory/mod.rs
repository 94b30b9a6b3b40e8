//! In-memory adapters used by tests and the command-line simulator.

mod entity;

pub use entity::InMemoryEntityRepository;
