//! Handler contract invoked when a scheduled task fires.

use async_trait::async_trait;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type returned by fired task actions.
pub type TaskActionResult = Result<(), TaskActionError>;

/// Executes the actions of tasks registered with a
/// [`TaskScheduler`](super::TaskScheduler).
///
/// A scheduler owns exactly one handler. Each task carries an action value
/// and an optional payload; when the task fires, both are handed to
/// [`fire`](Self::fire) outside of every scheduler lock.
#[async_trait]
pub trait TaskHandler: Send + Sync + 'static {
    /// Identifier of the entity owning a task.
    type Key: Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static;

    /// Action kind carried by each task.
    ///
    /// The registry keeps a copy of every pending action so callers can
    /// cancel selectively with [`cancel_task_if`](super::TaskScheduler::cancel_task_if).
    type Action: Clone + fmt::Debug + Send + 'static;

    /// Data forwarded to the action when it fires.
    type Payload: Send + 'static;

    /// Runs the action of a fired task.
    ///
    /// Errors are never returned to the caller that started the task; the
    /// scheduler logs them and forwards them to its failure sink.
    async fn fire(
        &self,
        key: Self::Key,
        action: Self::Action,
        payload: Option<Self::Payload>,
    ) -> TaskActionResult;
}

/// Errors produced while executing a fired task.
#[derive(Debug, Clone, Error)]
pub enum TaskActionError {
    /// The action reported a failure.
    #[error("task action failed: {0}")]
    Failed(Arc<dyn std::error::Error + Send + Sync>),

    /// The action did not complete within the scheduler's time limit.
    #[error("task action exceeded its time limit of {limit:?}")]
    TimedOut {
        /// Configured execution limit.
        limit: Duration,
    },
}

impl TaskActionError {
    /// Wraps an error raised by an action.
    pub fn failed(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Failed(Arc::new(err))
    }
}
