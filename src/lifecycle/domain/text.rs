//! Validated text values recorded against entities.

use super::LifecycleDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Cause recorded when an automatic countdown elapses unattended.
pub const DEFAULT_AUTOMATIC_CAUSE: &str = "heart attack";

/// Trims `value` and returns it when non-empty.
fn non_blank(value: String, error: LifecycleDomainError) -> Result<String, LifecycleDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(error);
    }
    Ok(trimmed.to_owned())
}

/// Display name of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityName(String);

impl EntityName {
    /// Creates a validated name.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::EmptyName`] when the name is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, LifecycleDomainError> {
        non_blank(value.into(), LifecycleDomainError::EmptyName).map(Self)
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short narrative describing how an entity dies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CauseText(String);

impl CauseText {
    /// Creates a validated cause.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::EmptyCause`] when the text is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, LifecycleDomainError> {
        non_blank(value.into(), LifecycleDomainError::EmptyCause).map(Self)
    }

    /// Returns the cause recorded by an unattended automatic death.
    #[must_use]
    pub fn automatic() -> Self {
        Self(DEFAULT_AUTOMATIC_CAUSE.to_owned())
    }

    /// Returns the cause as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CauseText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Detailed narrative appended after a cause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetailsText(String);

impl DetailsText {
    /// Creates validated details.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::EmptyDetails`] when the text is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, LifecycleDomainError> {
        non_blank(value.into(), LifecycleDomainError::EmptyDetails).map(Self)
    }

    /// Returns the details as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DetailsText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
