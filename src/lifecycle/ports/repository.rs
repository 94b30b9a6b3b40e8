//! Repository port for entity persistence and lifecycle writes.

use crate::lifecycle::domain::{
    CauseText, DetailsText, Entity, EntityAge, EntityId, EntityName, LifecycleDomainError,
    NewEntity,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for entity repository operations.
pub type EntityRepositoryResult<T> = Result<T, EntityRepositoryError>;

/// Entity persistence contract.
///
/// The lifecycle writes (`record_cause`, `record_details`,
/// `mark_automatic_death`, `mark_final_death`) are invoked at most once per
/// transition. Concurrent writes to one entity are last-write-wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityRepository: Send + Sync + 'static {
    /// Stores a new entity and assigns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::Persistence`] when storage fails.
    async fn insert(&self, entity: NewEntity) -> EntityRepositoryResult<Entity>;

    /// Finds an entity by identifier.
    ///
    /// Returns `None` when the entity does not exist.
    async fn find_by_id(&self, id: EntityId) -> EntityRepositoryResult<Option<Entity>>;

    /// Returns every stored entity ordered by identifier.
    async fn list_all(&self) -> EntityRepositoryResult<Vec<Entity>>;

    /// Replaces an entity's name and age, leaving its lifecycle untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::NotFound`] when the entity does not
    /// exist.
    async fn update_profile(
        &self,
        id: EntityId,
        name: &EntityName,
        age: EntityAge,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity>;

    /// Records the cause of death.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::NotFound`] when the entity does not
    /// exist or [`EntityRepositoryError::Rejected`] when its state does not
    /// accept a cause.
    async fn record_cause(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity>;

    /// Records the details of death.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::NotFound`] when the entity does not
    /// exist or [`EntityRepositoryError::Rejected`] when its state does not
    /// accept details.
    async fn record_details(
        &self,
        id: EntityId,
        details: &DetailsText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity>;

    /// Records an unattended death with the given cause.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::NotFound`] when the entity does not
    /// exist or [`EntityRepositoryError::Rejected`] when it is not pending
    /// automatic death.
    async fn mark_automatic_death(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity>;

    /// Records the final death of an entity whose narrative was supplied.
    ///
    /// # Errors
    ///
    /// Returns [`EntityRepositoryError::NotFound`] when the entity does not
    /// exist or [`EntityRepositoryError::Rejected`] when no cause was
    /// recorded or the entity is already dead.
    async fn mark_final_death(
        &self,
        id: EntityId,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity>;

    /// Removes an entity.
    ///
    /// Returns `false` when the entity did not exist.
    async fn delete(&self, id: EntityId) -> EntityRepositoryResult<bool>;
}

/// Errors returned by entity repository implementations.
#[derive(Debug, Clone, Error)]
pub enum EntityRepositoryError {
    /// The entity was not found.
    #[error("entity not found: {0}")]
    NotFound(EntityId),

    /// The stored entity refused the write.
    #[error("entity update rejected: {0}")]
    Rejected(#[from] LifecycleDomainError),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl EntityRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
