//! Entity lifecycle protocol.
//!
//! Entities are created with an automatic countdown. Adding a cause replaces
//! it with a longer countdown towards a final death; adding details replaces
//! that with a short one. When a countdown elapses the terminal transition is
//! persisted through the repository port. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
