//! Reaper: timed, cancellable terminal transitions for entities.
//!
//! An entity starts in a countdown state and is moved to a terminal state
//! when its countdown elapses, unless an external event arrives first and
//! re-arms the countdown with a different delay and terminal action.
//!
//! # Architecture
//!
//! - [`scheduler`]: keyed registry of delayed, cancellable tasks with at most
//!   one pending task per key
//! - [`lifecycle`]: the per-entity state machine built on the scheduler,
//!   following hexagonal principles (domain, ports, adapters, services)
//! - [`config`]: layered configuration for countdown delays and logging
//! - [`telemetry`]: `tracing` subscriber setup for binaries

pub mod config;
pub mod lifecycle;
pub mod scheduler;
pub mod telemetry;
