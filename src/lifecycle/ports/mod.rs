//! Port contracts for entity lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by lifecycle services.

pub mod repository;

pub use repository::{EntityRepository, EntityRepositoryError, EntityRepositoryResult};

#[cfg(test)]
pub use repository::MockEntityRepository;
