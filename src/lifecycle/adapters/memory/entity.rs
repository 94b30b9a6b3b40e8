//! In-memory repository for entity lifecycle tests and simulation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::lifecycle::{
    domain::{
        CauseText, DetailsText, Entity, EntityAge, EntityId, EntityName, LifecycleDomainError,
        NewEntity,
    },
    ports::{EntityRepository, EntityRepositoryError, EntityRepositoryResult},
};

/// Thread-safe in-memory entity repository.
///
/// Identifiers are assigned sequentially from one and never reused.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityRepository {
    state: Arc<RwLock<InMemoryEntityState>>,
}

#[derive(Debug, Default)]
struct InMemoryEntityState {
    entities: BTreeMap<EntityId, Entity>,
    last_id: u64,
}

impl InMemoryEntityRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EntityRepositoryResult<RwLockReadGuard<'_, InMemoryEntityState>> {
        self.state.read().map_err(|err| {
            EntityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> EntityRepositoryResult<RwLockWriteGuard<'_, InMemoryEntityState>> {
        self.state.write().map_err(|err| {
            EntityRepositoryError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    /// Applies `change` to a stored entity and returns the updated copy.
    fn modify(
        &self,
        id: EntityId,
        change: impl FnOnce(&mut Entity) -> Result<(), LifecycleDomainError>,
    ) -> EntityRepositoryResult<Entity> {
        let mut state = self.write()?;
        let entity = state
            .entities
            .get_mut(&id)
            .ok_or(EntityRepositoryError::NotFound(id))?;
        change(entity)?;
        Ok(entity.clone())
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn insert(&self, entity: NewEntity) -> EntityRepositoryResult<Entity> {
        let mut state = self.write()?;
        let next = state.last_id.checked_add(1).ok_or_else(|| {
            EntityRepositoryError::persistence(std::io::Error::other(
                "entity identifier space exhausted",
            ))
        })?;
        let id = EntityId::new(next)?;
        let stored = Entity::register(id, entity);
        state.last_id = next;
        state.entities.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: EntityId) -> EntityRepositoryResult<Option<Entity>> {
        let state = self.read()?;
        Ok(state.entities.get(&id).cloned())
    }

    async fn list_all(&self) -> EntityRepositoryResult<Vec<Entity>> {
        let state = self.read()?;
        Ok(state.entities.values().cloned().collect())
    }

    async fn update_profile(
        &self,
        id: EntityId,
        name: &EntityName,
        age: EntityAge,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.modify(id, |entity| {
            entity.update_profile(name.clone(), age, at);
            Ok(())
        })
    }

    async fn record_cause(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.modify(id, |entity| entity.record_cause(cause.clone(), at))
    }

    async fn record_details(
        &self,
        id: EntityId,
        details: &DetailsText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.modify(id, |entity| entity.record_details(details.clone(), at))
    }

    async fn mark_automatic_death(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.modify(id, |entity| entity.mark_automatic_death(cause.clone(), at))
    }

    async fn mark_final_death(
        &self,
        id: EntityId,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.modify(id, |entity| entity.mark_final_death(at))
    }

    async fn delete(&self, id: EntityId) -> EntityRepositoryResult<bool> {
        let mut state = self.write()?;
        Ok(state.entities.remove(&id).is_some())
    }
}
