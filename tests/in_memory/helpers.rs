//! Shared helpers for in-memory lifecycle integration tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::DefaultClock;
use reaper::lifecycle::{
    adapters::memory::InMemoryEntityRepository,
    domain::{CauseText, DetailsText, Entity, EntityAge, EntityId, EntityName, NewEntity},
    ports::{EntityRepository, EntityRepositoryResult},
    services::{LifecycleService, LifecycleSettings},
};
use rstest::fixture;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Short countdown used by paused-time tests.
pub const SHORT: Duration = Duration::from_secs(40);

/// Long countdown used by paused-time tests.
pub const LONG: Duration = Duration::from_secs(400);

/// Service type under test.
pub type CountingService = LifecycleService<CountingRepository, DefaultClock>;

/// Kind of terminal write observed by [`CountingRepository`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalWrite {
    /// `mark_automatic_death` was called.
    Automatic,
    /// `mark_final_death` was called.
    Final,
}

/// In-memory repository recording every terminal write attempt.
///
/// Lookups and narrative writes can be made to yield to the runtime so tests
/// can interleave concurrent events on one entity deterministically.
#[derive(Debug, Clone, Default)]
pub struct CountingRepository {
    inner: InMemoryEntityRepository,
    terminal_writes: Arc<Mutex<HashMap<EntityId, Vec<TerminalWrite>>>>,
    yield_after_lookup: bool,
    yield_before_write: bool,
}

impl CountingRepository {
    /// Yields after every `find_by_id`, so callers act on a snapshot that
    /// another task may already have changed.
    #[must_use]
    pub const fn yielding_after_lookup(mut self) -> Self {
        self.yield_after_lookup = true;
        self
    }

    /// Yields before every cause or details write.
    #[must_use]
    pub const fn yielding_before_write(mut self) -> Self {
        self.yield_before_write = true;
        self
    }

    async fn pause_before_write(&self) {
        if self.yield_before_write {
            tokio::task::yield_now().await;
        }
    }

    /// Returns the terminal writes attempted for `id`, in call order.
    pub fn terminal_writes(&self, id: EntityId) -> Vec<TerminalWrite> {
        self.terminal_writes
            .lock()
            .expect("terminal write lock")
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, id: EntityId, write: TerminalWrite) {
        self.terminal_writes
            .lock()
            .expect("terminal write lock")
            .entry(id)
            .or_default()
            .push(write);
    }
}

#[async_trait]
impl EntityRepository for CountingRepository {
    async fn insert(&self, entity: NewEntity) -> EntityRepositoryResult<Entity> {
        self.inner.insert(entity).await
    }

    async fn find_by_id(&self, id: EntityId) -> EntityRepositoryResult<Option<Entity>> {
        let found = self.inner.find_by_id(id).await;
        if self.yield_after_lookup {
            tokio::task::yield_now().await;
        }
        found
    }

    async fn list_all(&self) -> EntityRepositoryResult<Vec<Entity>> {
        self.inner.list_all().await
    }

    async fn update_profile(
        &self,
        id: EntityId,
        name: &EntityName,
        age: EntityAge,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.inner.update_profile(id, name, age, at).await
    }

    async fn record_cause(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.pause_before_write().await;
        self.inner.record_cause(id, cause, at).await
    }

    async fn record_details(
        &self,
        id: EntityId,
        details: &DetailsText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.pause_before_write().await;
        self.inner.record_details(id, details, at).await
    }

    async fn mark_automatic_death(
        &self,
        id: EntityId,
        cause: &CauseText,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.record(id, TerminalWrite::Automatic);
        self.inner.mark_automatic_death(id, cause, at).await
    }

    async fn mark_final_death(
        &self,
        id: EntityId,
        at: DateTime<Utc>,
    ) -> EntityRepositoryResult<Entity> {
        self.record(id, TerminalWrite::Final);
        self.inner.mark_final_death(id, at).await
    }

    async fn delete(&self, id: EntityId) -> EntityRepositoryResult<bool> {
        self.inner.delete(id).await
    }
}

/// Provides a fresh counting repository for each test.
#[fixture]
pub fn repository() -> Arc<CountingRepository> {
    Arc::new(CountingRepository::default())
}

/// Provides settings with the default forty and four hundred second delays.
#[fixture]
pub fn settings() -> LifecycleSettings {
    LifecycleSettings::new(SHORT, LONG)
}

/// Starts a lifecycle service over `repository` on the current runtime.
pub fn start_service(
    repository: &Arc<CountingRepository>,
    settings: LifecycleSettings,
) -> CountingService {
    LifecycleService::new(Arc::clone(repository), Arc::new(DefaultClock), settings)
        .expect("service should start inside a runtime")
}
