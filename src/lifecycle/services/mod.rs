//! Application services for entity lifecycle orchestration.

mod lifecycle;
mod recorder;
mod settings;

pub use lifecycle::{
    CreateEntityRequest, LifecycleError, LifecycleResult, LifecycleScheduler, LifecycleService,
    UpdateEntityRequest,
};
pub use recorder::DeathRecorder;
pub use settings::{DEFAULT_LONG_DELAY, DEFAULT_SHORT_DELAY, LifecycleSettings};
