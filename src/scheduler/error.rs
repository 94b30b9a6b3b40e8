//! Error and failure-report types for the task scheduler.

use super::{TaskActionError, TaskTicket};
use thiserror::Error;

/// Errors raised while constructing a scheduler.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// No tokio runtime was available to drive timers.
    #[error("task scheduler requires a running tokio runtime")]
    NoRuntime,
}

/// Report emitted for a fired task whose action failed.
#[derive(Debug, Clone)]
pub struct TaskFailure<K> {
    /// Key of the entity that owned the task.
    pub key: K,
    /// Registration the failure belongs to.
    pub ticket: TaskTicket,
    /// Debug rendering of the action that failed.
    pub action: String,
    /// Failure raised by the action.
    pub error: TaskActionError,
}
