//! Service layer driving entity countdowns through the task scheduler.

use super::{DeathRecorder, LifecycleSettings};
use crate::lifecycle::{
    domain::{
        CauseText, DeathAction, DetailsText, Entity, EntityAge, EntityId, EntityName,
        LifecycleDomainError, LifecycleEvent, LifecycleState, NewEntity,
    },
    ports::{EntityRepository, EntityRepositoryError, EntityRepositoryResult},
};
use crate::scheduler::{SchedulerError, SchedulerOptions, TaskScheduler};
use mockable::Clock;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Request payload for creating an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateEntityRequest {
    name: String,
    age: u32,
}

impl CreateEntityRequest {
    /// Creates a request with the entity's name and age.
    #[must_use]
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// Request payload for replacing an entity's name and age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateEntityRequest {
    name: String,
    age: u32,
}

impl UpdateEntityRequest {
    /// Creates a request with the replacement name and age.
    #[must_use]
    pub fn new(name: impl Into<String>, age: u32) -> Self {
        Self {
            name: name.into(),
            age,
        }
    }
}

/// Service-level errors for entity lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] LifecycleDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] EntityRepositoryError),
    /// The scheduler could not be created.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    /// The entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(EntityId),
    /// The countdown the event expected to replace is no longer pending:
    /// it fired, or a concurrent event replaced it first.
    #[error("countdown for entity {0} is no longer pending")]
    CountdownElapsed(EntityId),
}

/// Result type for lifecycle service operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Scheduler type driving lifecycle countdowns.
pub type LifecycleScheduler<R, C> = TaskScheduler<DeathRecorder<R, C>>;

/// Entity lifecycle orchestration service.
///
/// Every live entity owns exactly one pending countdown in the scheduler.
/// Events cancel that countdown before persisting and arm the countdown of
/// the resulting state afterwards, so at most one terminal write happens per
/// entity.
pub struct LifecycleService<R, C>
where
    R: EntityRepository,
    C: Clock + Send + Sync + 'static,
{
    repository: Arc<R>,
    clock: Arc<C>,
    scheduler: LifecycleScheduler<R, C>,
    settings: LifecycleSettings,
}

impl<R, C> LifecycleService<R, C>
where
    R: EntityRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a lifecycle service on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Scheduler`] when called outside a tokio
    /// runtime.
    pub fn new(
        repository: Arc<R>,
        clock: Arc<C>,
        settings: LifecycleSettings,
    ) -> LifecycleResult<Self> {
        Self::with_scheduler_options(repository, clock, settings, SchedulerOptions::new())
    }

    /// Creates a lifecycle service whose scheduler uses `options`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Scheduler`] when called outside a tokio
    /// runtime.
    pub fn with_scheduler_options(
        repository: Arc<R>,
        clock: Arc<C>,
        settings: LifecycleSettings,
        options: SchedulerOptions<EntityId>,
    ) -> LifecycleResult<Self> {
        let recorder = DeathRecorder::new(Arc::clone(&repository), Arc::clone(&clock));
        let scheduler = TaskScheduler::with_options(Arc::new(recorder), options)?;
        Ok(Self {
            repository,
            clock,
            scheduler,
            settings,
        })
    }

    /// Creates an entity and starts its automatic countdown.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Domain`] when the name is blank or the age
    /// is zero, or [`LifecycleError::Repository`] when storage fails.
    pub async fn create(&self, request: CreateEntityRequest) -> LifecycleResult<Entity> {
        let name = EntityName::new(request.name)?;
        let age = EntityAge::new(request.age)?;
        let entity = self
            .repository
            .insert(NewEntity::new(name, age, &*self.clock))
            .await?;
        self.arm(entity.id(), entity.state());
        info!(entity_id = %entity.id(), name = %entity.name(), "entity created");
        Ok(entity)
    }

    /// Records a cause and replaces the automatic countdown with the long
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Domain`] for blank text or when the entity
    /// is not pending automatic death, [`LifecycleError::NotFound`] for
    /// unknown entities, [`LifecycleError::CountdownElapsed`] when the
    /// automatic countdown is no longer pending, or
    /// [`LifecycleError::Repository`] when storage fails.
    pub async fn add_cause(
        &self,
        entity_id: EntityId,
        cause: impl Into<String>,
    ) -> LifecycleResult<Entity> {
        let cause_text = CauseText::new(cause)?;
        let entity = self
            .claim_countdown(entity_id, LifecycleEvent::CauseAdded)
            .await?;
        let written = self
            .repository
            .record_cause(entity_id, &cause_text, self.clock.utc())
            .await;
        self.settle(&entity, LifecycleEvent::CauseAdded, written).await
    }

    /// Records details and replaces the pending countdown with the short
    /// one.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Domain`] for blank text or when no cause has
    /// been recorded, [`LifecycleError::NotFound`] for unknown entities,
    /// [`LifecycleError::CountdownElapsed`] when the countdown of the current
    /// state is no longer pending, or [`LifecycleError::Repository`] when
    /// storage fails.
    pub async fn add_details(
        &self,
        entity_id: EntityId,
        details: impl Into<String>,
    ) -> LifecycleResult<Entity> {
        let details_text = DetailsText::new(details)?;
        let entity = self
            .claim_countdown(entity_id, LifecycleEvent::DetailsAdded)
            .await?;
        let written = self
            .repository
            .record_details(entity_id, &details_text, self.clock.utc())
            .await;
        self.settle(&entity, LifecycleEvent::DetailsAdded, written).await
    }

    /// Returns the current record of an entity.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for unknown entities or
    /// [`LifecycleError::Repository`] when the lookup fails.
    pub async fn status(&self, entity_id: EntityId) -> LifecycleResult<Entity> {
        self.require(entity_id).await
    }

    /// Returns every entity ordered by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Repository`] when the lookup fails.
    pub async fn list(&self) -> LifecycleResult<Vec<Entity>> {
        Ok(self.repository.list_all().await?)
    }

    /// Replaces an entity's name and age.
    ///
    /// The lifecycle state and any pending countdown are left as they are,
    /// so dead entities can be edited too.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Domain`] when the name is blank or the age
    /// is zero, [`LifecycleError::NotFound`] for unknown entities, or
    /// [`LifecycleError::Repository`] when storage fails.
    pub async fn update(
        &self,
        entity_id: EntityId,
        request: UpdateEntityRequest,
    ) -> LifecycleResult<Entity> {
        let name = EntityName::new(request.name)?;
        let age = EntityAge::new(request.age)?;
        let updated = self
            .repository
            .update_profile(entity_id, &name, age, self.clock.utc())
            .await
            .map_err(|err| match err {
                EntityRepositoryError::NotFound(missing) => LifecycleError::NotFound(missing),
                other => LifecycleError::Repository(other),
            })?;
        info!(entity_id = %entity_id, name = %updated.name(), "entity updated");
        Ok(updated)
    }

    /// Cancels any pending countdown and removes the entity.
    ///
    /// Returns `false` when the entity did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Repository`] when storage fails.
    pub async fn delete(&self, entity_id: EntityId) -> LifecycleResult<bool> {
        let cancelled = self.scheduler.cancel_task(entity_id);
        let removed = self.repository.delete(entity_id).await?;
        info!(entity_id = %entity_id, cancelled, removed, "entity deleted");
        Ok(removed)
    }

    /// Returns the countdown settings.
    #[must_use]
    pub const fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Returns `true` while a countdown is pending for the entity.
    #[must_use]
    pub fn has_pending_countdown(&self, entity_id: EntityId) -> bool {
        self.scheduler.is_pending(entity_id)
    }

    /// Returns the number of pending countdowns.
    #[must_use]
    pub fn pending_countdowns(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Drops every pending countdown and stops scheduling new ones.
    ///
    /// Returns how many countdowns were dropped.
    pub fn shutdown(&self) -> usize {
        self.scheduler.shutdown()
    }

    async fn require(&self, entity_id: EntityId) -> LifecycleResult<Entity> {
        self.repository
            .find_by_id(entity_id)
            .await?
            .ok_or(LifecycleError::NotFound(entity_id))
    }

    /// Validates `event` against the stored entity and cancels the countdown
    /// of its state.
    ///
    /// Only the countdown matching the validated state is cancelled. When a
    /// concurrent event has already moved the entity on, its countdown stays
    /// in place and this event is rejected.
    async fn claim_countdown(
        &self,
        entity_id: EntityId,
        event: LifecycleEvent,
    ) -> LifecycleResult<Entity> {
        let entity = self.require(entity_id).await?;
        entity.next_state(event)?;
        let expected = entity
            .state()
            .countdown(entity_id)
            .map(|countdown| countdown.action);
        if !self
            .scheduler
            .cancel_task_if(entity_id, |pending| Some(*pending) == expected)
        {
            warn!(
                entity_id = %entity_id,
                %event,
                state = %entity.state(),
                "countdown no longer pending"
            );
            return Err(LifecycleError::CountdownElapsed(entity_id));
        }
        Ok(entity)
    }

    /// Arms the countdown following a narrative write.
    async fn settle(
        &self,
        before: &Entity,
        event: LifecycleEvent,
        written: EntityRepositoryResult<Entity>,
    ) -> LifecycleResult<Entity> {
        match written {
            Ok(updated) => {
                self.arm(updated.id(), updated.state());
                info!(
                    entity_id = %updated.id(),
                    %event,
                    state = %updated.state(),
                    "lifecycle event recorded"
                );
                Ok(updated)
            }
            Err(err) => {
                self.restore_countdown(before).await;
                warn!(
                    entity_id = %before.id(),
                    %event,
                    error = %err,
                    "lifecycle event not recorded"
                );
                Err(err.into())
            }
        }
    }

    /// Re-arms a countdown after a failed narrative write.
    ///
    /// The countdown follows the stored state, which may have moved on since
    /// `before` was read. Deleted and dead entities get none, and a countdown
    /// armed meanwhile by another event is kept.
    async fn restore_countdown(&self, before: &Entity) {
        let entity_id = before.id();
        let state = match self.repository.find_by_id(entity_id).await {
            Ok(Some(current)) => current.state(),
            Ok(None) => {
                debug!(entity_id = %entity_id, "entity removed; no countdown restored");
                return;
            }
            Err(err) => {
                warn!(
                    entity_id = %entity_id,
                    error = %err,
                    "entity reload failed; restoring countdown from the last read"
                );
                before.state()
            }
        };
        let Some((delay, action, payload)) = self.countdown_task(entity_id, state) else {
            return;
        };
        if self
            .scheduler
            .start_task_if_idle(entity_id, delay, action, payload)
        {
            info!(entity_id = %entity_id, %state, "countdown re-armed");
        }
    }

    fn arm(&self, entity_id: EntityId, state: LifecycleState) {
        if let Some((delay, action, payload)) = self.countdown_task(entity_id, state) {
            self.scheduler.start_task(entity_id, delay, action, payload);
        }
    }

    fn countdown_task(
        &self,
        entity_id: EntityId,
        state: LifecycleState,
    ) -> Option<(Duration, DeathAction, Option<CauseText>)> {
        let countdown = state.countdown(entity_id)?;
        let payload = match countdown.action {
            DeathAction::AutomaticDeath(_) => Some(self.settings.automatic_cause.clone()),
            DeathAction::FinalDeath(_) => None,
        };
        Some((self.settings.delay(countdown.delay), countdown.action, payload))
    }
}
