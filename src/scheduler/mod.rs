//! Delayed-task scheduler keyed by entity.
//!
//! The scheduler keeps at most one pending task per key. Starting a task for
//! a key supersedes whatever was pending for it, cancellation only succeeds
//! while the task has not begun firing, and a fired task is removed from the
//! registry before its action runs.
//!
//! Actions are not opaque closures: every task carries an
//! [`Action`](TaskHandler::Action) value which the scheduler's single
//! [`TaskHandler`] interprets when the task fires.

mod action;
mod error;
mod registry;

pub use action::{TaskActionError, TaskActionResult, TaskHandler};
pub use error::{SchedulerError, TaskFailure};
pub use registry::{SchedulerOptions, TaskScheduler, TaskTicket};

#[cfg(test)]
mod tests;
