//! Task handler persisting terminal transitions when countdowns elapse.

use crate::lifecycle::{
    domain::{CauseText, DeathAction, EntityId},
    ports::EntityRepository,
};
use crate::scheduler::{TaskActionError, TaskActionResult, TaskHandler};
use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// A countdown fired under a key other than the entity its action targets.
#[derive(Debug, Error)]
#[error("{action} fired under key {key}")]
struct MisroutedAction {
    key: EntityId,
    action: DeathAction,
}

/// Interprets [`DeathAction`]s fired by the lifecycle scheduler.
///
/// Automatic deaths record the cause carried as payload, falling back to
/// [`CauseText::automatic`]. Final deaths record the time of death only.
pub struct DeathRecorder<R, C> {
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> DeathRecorder<R, C>
where
    R: EntityRepository,
    C: Clock + Send + Sync + 'static,
{
    /// Creates a recorder writing through `repository`.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl<R, C> TaskHandler for DeathRecorder<R, C>
where
    R: EntityRepository,
    C: Clock + Send + Sync + 'static,
{
    type Key = EntityId;
    type Action = DeathAction;
    type Payload = CauseText;

    async fn fire(
        &self,
        key: EntityId,
        action: DeathAction,
        payload: Option<CauseText>,
    ) -> TaskActionResult {
        if action.entity_id() != key {
            return Err(TaskActionError::failed(MisroutedAction { key, action }));
        }
        let at = self.clock.utc();
        match action {
            DeathAction::AutomaticDeath(entity_id) => {
                let cause = payload.unwrap_or_else(CauseText::automatic);
                self.repository
                    .mark_automatic_death(entity_id, &cause, at)
                    .await
                    .map_err(TaskActionError::failed)?;
                info!(entity_id = %entity_id, cause = %cause, "automatic death recorded");
            }
            DeathAction::FinalDeath(entity_id) => {
                self.repository
                    .mark_final_death(entity_id, at)
                    .await
                    .map_err(TaskActionError::failed)?;
                info!(entity_id = %entity_id, "final death recorded");
            }
        }
        Ok(())
    }
}
