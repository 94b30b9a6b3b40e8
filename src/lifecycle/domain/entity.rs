//! Entity aggregate root and its lifecycle transitions.

use super::{
    CauseText, DetailsText, EntityAge, EntityId, EntityName, LifecycleDomainError,
    LifecycleEvent, LifecycleState,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Entity data awaiting an identifier from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntity {
    name: EntityName,
    age: EntityAge,
    created_at: DateTime<Utc>,
}

impl NewEntity {
    /// Creates entity data stamped with the current clock time.
    #[must_use]
    pub fn new(name: EntityName, age: EntityAge, clock: &impl Clock) -> Self {
        Self {
            name,
            age,
            created_at: clock.utc(),
        }
    }

    /// Returns the entity name.
    #[must_use]
    pub const fn name(&self) -> &EntityName {
        &self.name
    }

    /// Returns the entity age.
    #[must_use]
    pub const fn age(&self) -> EntityAge {
        self.age
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Entity aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    name: EntityName,
    age: EntityAge,
    state: LifecycleState,
    cause: Option<CauseText>,
    details: Option<DetailsText>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    death_time: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted entity aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedEntityData {
    /// Persisted entity identifier.
    pub id: EntityId,
    /// Persisted name.
    pub name: EntityName,
    /// Persisted age.
    pub age: EntityAge,
    /// Persisted lifecycle state.
    pub state: LifecycleState,
    /// Persisted cause, if any.
    pub cause: Option<CauseText>,
    /// Persisted details, if any.
    pub details: Option<DetailsText>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest lifecycle timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted time of death, if any.
    pub death_time: Option<DateTime<Utc>>,
}

impl Entity {
    /// Registers new entity data under the identifier assigned by storage.
    #[must_use]
    pub fn register(id: EntityId, data: NewEntity) -> Self {
        Self {
            id,
            name: data.name,
            age: data.age,
            state: LifecycleState::PendingAutomatic,
            cause: None,
            details: None,
            created_at: data.created_at,
            updated_at: data.created_at,
            death_time: None,
        }
    }

    /// Reconstructs an entity from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedEntityData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            age: data.age,
            state: data.state,
            cause: data.cause,
            details: data.details,
            created_at: data.created_at,
            updated_at: data.updated_at,
            death_time: data.death_time,
        }
    }

    /// Returns the entity identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity name.
    #[must_use]
    pub const fn name(&self) -> &EntityName {
        &self.name
    }

    /// Returns the entity age.
    #[must_use]
    pub const fn age(&self) -> EntityAge {
        self.age
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Returns the recorded cause, if any.
    #[must_use]
    pub const fn cause(&self) -> Option<&CauseText> {
        self.cause.as_ref()
    }

    /// Returns the recorded details, if any.
    #[must_use]
    pub const fn details(&self) -> Option<&DetailsText> {
        self.details.as_ref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest lifecycle timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the time of death, if the entity is dead.
    #[must_use]
    pub const fn death_time(&self) -> Option<DateTime<Utc>> {
        self.death_time
    }

    /// Returns `true` once the terminal transition has been recorded.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.death_time.is_some()
    }

    /// Replaces the name and age.
    ///
    /// Profile edits are allowed in every state and never affect the
    /// lifecycle.
    pub fn update_profile(&mut self, name: EntityName, age: EntityAge, at: DateTime<Utc>) {
        self.name = name;
        self.age = age;
        self.updated_at = at;
    }

    /// Returns the state `event` would move this entity to.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidTransition`] when the current
    /// state does not accept the event.
    pub const fn next_state(
        &self,
        event: LifecycleEvent,
    ) -> Result<LifecycleState, LifecycleDomainError> {
        match self.state.next(event) {
            Some(state) => Ok(state),
            None => Err(LifecycleDomainError::InvalidTransition {
                entity_id: self.id,
                state: self.state,
                event,
            }),
        }
    }

    /// Records the cause and starts the long countdown state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidTransition`] unless the entity
    /// is pending automatic death.
    pub fn record_cause(
        &mut self,
        cause: CauseText,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleDomainError> {
        self.state = self.next_state(LifecycleEvent::CauseAdded)?;
        self.cause = Some(cause);
        self.updated_at = at;
        Ok(())
    }

    /// Records the details, replacing any earlier details.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidTransition`] unless a cause has
    /// been recorded and the entity is still alive.
    pub fn record_details(
        &mut self,
        details: DetailsText,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleDomainError> {
        self.state = self.next_state(LifecycleEvent::DetailsAdded)?;
        self.details = Some(details);
        self.updated_at = at;
        Ok(())
    }

    /// Records an unattended death with the given cause.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidTransition`] unless the entity
    /// is pending automatic death.
    pub fn mark_automatic_death(
        &mut self,
        cause: CauseText,
        at: DateTime<Utc>,
    ) -> Result<(), LifecycleDomainError> {
        if self.state != LifecycleState::PendingAutomatic {
            return Err(LifecycleDomainError::InvalidTransition {
                entity_id: self.id,
                state: self.state,
                event: LifecycleEvent::CountdownElapsed,
            });
        }
        self.die(at)?;
        self.cause = Some(cause);
        Ok(())
    }

    /// Records the final death, keeping the narrative already recorded.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleDomainError::InvalidTransition`] unless a cause has
    /// been recorded and the entity is still alive.
    pub fn mark_final_death(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleDomainError> {
        if self.state == LifecycleState::PendingAutomatic {
            return Err(LifecycleDomainError::InvalidTransition {
                entity_id: self.id,
                state: self.state,
                event: LifecycleEvent::CountdownElapsed,
            });
        }
        self.die(at)
    }

    fn die(&mut self, at: DateTime<Utc>) -> Result<(), LifecycleDomainError> {
        self.state = self.next_state(LifecycleEvent::CountdownElapsed)?;
        self.death_time = Some(at);
        self.updated_at = at;
        Ok(())
    }
}
