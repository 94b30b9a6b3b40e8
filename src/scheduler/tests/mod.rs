//! Unit tests for the task scheduler.
//!
//! Timer behaviour is exercised on paused tokio time so delays elapse
//! deterministically; the cancellation race runs on a multi-threaded runtime
//! with real time.
