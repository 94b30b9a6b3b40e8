//! Keyed registry of pending delayed tasks.

use super::{SchedulerError, TaskActionError, TaskFailure, TaskHandler};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, error, info, warn};

/// Identifies a single registration of a task.
///
/// Tickets are unique for the lifetime of a scheduler. A timer compares its
/// ticket with the registry entry for its key before firing, so a timer whose
/// registration was cancelled or superseded never runs its action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskTicket(u64);

impl TaskTicket {
    /// Returns the raw ticket number.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Optional scheduler behaviour.
#[derive(Debug)]
pub struct SchedulerOptions<K> {
    action_timeout: Option<Duration>,
    failure_sink: Option<mpsc::UnboundedSender<TaskFailure<K>>>,
}

impl<K> Default for SchedulerOptions<K> {
    fn default() -> Self {
        Self {
            action_timeout: None,
            failure_sink: None,
        }
    }
}

impl<K> SchedulerOptions<K> {
    /// Creates options with no action time limit and no failure sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds how long a fired action may run before it is reported as
    /// timed out.
    #[must_use]
    pub const fn with_action_timeout(mut self, limit: Duration) -> Self {
        self.action_timeout = Some(limit);
        self
    }

    /// Forwards every failed action to the given channel.
    #[must_use]
    pub fn with_failure_sink(mut self, sink: mpsc::UnboundedSender<TaskFailure<K>>) -> Self {
        self.failure_sink = Some(sink);
        self
    }
}

#[derive(Debug)]
struct PendingTask<A> {
    ticket: TaskTicket,
    action: A,
    timer: AbortHandle,
}

#[derive(Debug)]
struct Registry<K, A> {
    pending: HashMap<K, PendingTask<A>>,
    next_ticket: u64,
    closed: bool,
}

impl<K, A> Registry<K, A> {
    fn new() -> Self {
        Self {
            pending: HashMap::new(),
            next_ticket: 0,
            closed: false,
        }
    }

    fn issue_ticket(&mut self) -> TaskTicket {
        self.next_ticket = self.next_ticket.wrapping_add(1);
        TaskTicket(self.next_ticket)
    }
}

struct SchedulerShared<H: TaskHandler> {
    handler: Arc<H>,
    registry: Mutex<Registry<H::Key, H::Action>>,
    runtime: Handle,
    action_timeout: Option<Duration>,
    failure_sink: Option<mpsc::UnboundedSender<TaskFailure<H::Key>>>,
}

impl<H: TaskHandler> SchedulerShared<H> {
    /// Locks the registry.
    ///
    /// Critical sections only touch the map, so state behind a poisoned lock
    /// is still consistent and is recovered rather than propagated.
    fn lock_registry(&self) -> MutexGuard<'_, Registry<H::Key, H::Action>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Removes the entry for `key` when it still belongs to `ticket`.
    fn claim(&self, key: H::Key, ticket: TaskTicket) -> bool {
        let mut registry = self.lock_registry();
        let owns_key = registry
            .pending
            .get(&key)
            .is_some_and(|entry| entry.ticket == ticket);
        if owns_key {
            registry.pending.remove(&key);
        }
        owns_key
    }

    async fn fire(
        &self,
        key: H::Key,
        ticket: TaskTicket,
        action: H::Action,
        payload: Option<H::Payload>,
    ) {
        if !self.claim(key, ticket) {
            debug!(%key, %ticket, "timer elapsed for a task that no longer owns its key");
            return;
        }

        let label = format!("{action:?}");
        debug!(%key, %ticket, action = %label, "task firing");
        let execution = self.handler.fire(key, action, payload);
        let outcome = match self.action_timeout {
            Some(limit) => tokio::time::timeout(limit, execution)
                .await
                .unwrap_or(Err(TaskActionError::TimedOut { limit })),
            None => execution.await,
        };

        match outcome {
            Ok(()) => debug!(%key, %ticket, action = %label, "task completed"),
            Err(err) => self.report_failure(TaskFailure {
                key,
                ticket,
                action: label,
                error: err,
            }),
        }
    }

    fn report_failure(&self, failure: TaskFailure<H::Key>) {
        error!(
            key = %failure.key,
            ticket = %failure.ticket,
            action = %failure.action,
            error = %failure.error,
            "scheduled task action failed"
        );
        if let Some(sink) = &self.failure_sink {
            if sink.send(failure).is_err() {
                warn!("task failure sink is closed; dropping failure report");
            }
        }
    }
}

/// Runs delayed actions keyed by entity, with at most one pending task per
/// key.
///
/// Each task gets its own timer on the tokio runtime. The registry lock is
/// held only while the map is updated, never while a timer sleeps or an
/// action runs, so a slow action for one key cannot delay bookkeeping for
/// another.
///
/// Cloning a scheduler yields another handle to the same registry.
pub struct TaskScheduler<H: TaskHandler> {
    shared: Arc<SchedulerShared<H>>,
}

impl<H: TaskHandler> Clone for TaskScheduler<H> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<H: TaskHandler> fmt::Debug for TaskScheduler<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.shared.lock_registry();
        f.debug_struct("TaskScheduler")
            .field("pending", &registry.pending.len())
            .field("closed", &registry.closed)
            .field("action_timeout", &self.shared.action_timeout)
            .finish_non_exhaustive()
    }
}

impl<H: TaskHandler> TaskScheduler<H> {
    /// Creates a scheduler bound to the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn new(handler: Arc<H>) -> Result<Self, SchedulerError> {
        Self::with_options(handler, SchedulerOptions::new())
    }

    /// Creates a scheduler bound to the current tokio runtime with the given
    /// options.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::NoRuntime`] when called outside a tokio
    /// runtime.
    pub fn with_options(
        handler: Arc<H>,
        options: SchedulerOptions<H::Key>,
    ) -> Result<Self, SchedulerError> {
        let runtime = Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        Ok(Self::on_runtime(handler, runtime, options))
    }

    /// Creates a scheduler whose timers run on `runtime`.
    #[must_use]
    pub fn on_runtime(handler: Arc<H>, runtime: Handle, options: SchedulerOptions<H::Key>) -> Self {
        Self {
            shared: Arc::new(SchedulerShared {
                handler,
                registry: Mutex::new(Registry::new()),
                runtime,
                action_timeout: options.action_timeout,
                failure_sink: options.failure_sink,
            }),
        }
    }

    /// Registers a task that fires `action` with `payload` once `delay` has
    /// elapsed.
    ///
    /// Any task already pending for `key` is cancelled and replaced. If that
    /// task has already begun firing it completes with its own payload, and
    /// the new registration still takes effect. After [`shutdown`](Self::shutdown)
    /// the call is ignored.
    pub fn start_task(
        &self,
        key: H::Key,
        delay: Duration,
        action: H::Action,
        payload: Option<H::Payload>,
    ) {
        self.register(key, delay, action, payload, true);
    }

    /// Registers a task only when nothing is pending for `key`.
    ///
    /// Returns `true` when the task was registered. A pending task is left
    /// untouched and `false` is returned, as it is after
    /// [`shutdown`](Self::shutdown).
    pub fn start_task_if_idle(
        &self,
        key: H::Key,
        delay: Duration,
        action: H::Action,
        payload: Option<H::Payload>,
    ) -> bool {
        self.register(key, delay, action, payload, false)
    }

    fn register(
        &self,
        key: H::Key,
        delay: Duration,
        action: H::Action,
        payload: Option<H::Payload>,
        supersede: bool,
    ) -> bool {
        let mut registry = self.shared.lock_registry();
        if registry.closed {
            warn!(%key, ?action, "task scheduler is shut down; task not started");
            return false;
        }
        if !supersede && registry.pending.contains_key(&key) {
            debug!(%key, ?action, "task already pending; registration skipped");
            return false;
        }

        let ticket = registry.issue_ticket();
        if let Some(previous) = registry.pending.remove(&key) {
            previous.timer.abort();
            debug!(%key, superseded = %previous.ticket, %ticket, "superseded pending task");
        }

        // The entry is inserted before the lock is released, so even a zero
        // delay timer finds its own ticket when it claims the key.
        let shared = Arc::clone(&self.shared);
        let fired = action.clone();
        let timer = self.shared.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire(key, ticket, fired, payload).await;
        });
        registry.pending.insert(
            key,
            PendingTask {
                ticket,
                action,
                timer: timer.abort_handle(),
            },
        );
        debug!(%key, %ticket, ?delay, "task scheduled");
        true
    }

    /// Cancels the task pending for `key`.
    ///
    /// Returns `true` when a task was pending and will never run its action.
    /// Returns `false` when no task was registered or the task has already
    /// begun firing; a running action is never interrupted.
    pub fn cancel_task(&self, key: H::Key) -> bool {
        self.cancel_task_if(key, |_| true)
    }

    /// Cancels the task pending for `key` only when `accepts` approves its
    /// action.
    ///
    /// The check and the removal happen under one registry lock, so a task
    /// registered by someone else is never cancelled by mistake. Returns
    /// `false` when nothing matching was pending.
    pub fn cancel_task_if(&self, key: H::Key, accepts: impl FnOnce(&H::Action) -> bool) -> bool {
        let removed = {
            let mut registry = self.shared.lock_registry();
            let owned = registry
                .pending
                .get(&key)
                .is_some_and(|entry| accepts(&entry.action));
            if owned {
                registry.pending.remove(&key)
            } else {
                None
            }
        };
        match removed {
            Some(entry) => {
                entry.timer.abort();
                debug!(%key, ticket = %entry.ticket, "task cancelled");
                true
            }
            None => {
                debug!(%key, "no matching pending task to cancel");
                false
            }
        }
    }

    /// Returns `true` when a task is pending for `key`.
    #[must_use]
    pub fn is_pending(&self, key: H::Key) -> bool {
        self.shared.lock_registry().pending.contains_key(&key)
    }

    /// Returns the number of pending tasks.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.shared.lock_registry().pending.len()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shared.lock_registry().closed
    }

    /// Cancels every pending task and stops accepting new ones.
    ///
    /// Returns how many pending tasks were cancelled. Actions that have
    /// already begun firing run to completion.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<PendingTask<H::Action>> = {
            let mut registry = self.shared.lock_registry();
            registry.closed = true;
            registry.pending.drain().map(|(_, entry)| entry).collect()
        };
        for entry in &drained {
            entry.timer.abort();
        }
        info!(cancelled = drained.len(), "task scheduler shut down");
        drained.len()
    }
}
