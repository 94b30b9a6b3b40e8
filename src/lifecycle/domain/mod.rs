//! Domain model for entity lifecycles.
//!
//! The domain covers entity records, validated text values, the four-state
//! lifecycle machine and the terminal actions a countdown can run. It has no
//! knowledge of timers or storage.

mod action;
mod entity;
mod error;
mod ids;
mod state;
mod text;

pub use action::{Countdown, CountdownDelay, DeathAction};
pub use entity::{Entity, NewEntity, PersistedEntityData};
pub use error::{LifecycleDomainError, ParseLifecycleStateError};
pub use ids::{EntityAge, EntityId};
pub use state::{LifecycleEvent, LifecycleState};
pub use text::{CauseText, DEFAULT_AUTOMATIC_CAUSE, DetailsText, EntityName};
