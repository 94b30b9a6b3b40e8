//! Identifier and validated scalar types for the lifecycle domain.

use super::LifecycleDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an entity, assigned by the repository on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a validated entity identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidEntityId`] when the value is
    /// zero.
    pub const fn new(value: u64) -> Result<Self, LifecycleDomainError> {
        if value == 0 {
            return Err(LifecycleDomainError::InvalidEntityId(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positive age of an entity in years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityAge(u32);

impl EntityAge {
    /// Creates a validated age.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidAge`] when the value is zero.
    pub const fn new(value: u32) -> Result<Self, LifecycleDomainError> {
        if value == 0 {
            return Err(LifecycleDomainError::InvalidAge(value));
        }
        Ok(Self(value))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
