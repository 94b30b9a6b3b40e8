//! Error types for lifecycle domain validation and parsing.

use super::{EntityId, LifecycleEvent, LifecycleState};
use thiserror::Error;

/// Errors returned while constructing lifecycle values or applying events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LifecycleDomainError {
    /// Entity identifiers start at one.
    #[error("invalid entity identifier {0}, expected a positive integer")]
    InvalidEntityId(u64),

    /// The entity name is empty after trimming.
    #[error("entity name must not be empty")]
    EmptyName,

    /// The entity age is not positive.
    #[error("invalid age {0}, expected a positive integer")]
    InvalidAge(u32),

    /// The cause is empty after trimming.
    #[error("cause must not be empty")]
    EmptyCause,

    /// The details are empty after trimming.
    #[error("details must not be empty")]
    EmptyDetails,

    /// The event is not accepted in the entity's current state.
    #[error("entity {entity_id} cannot accept {event} while {state}")]
    InvalidTransition {
        /// Entity the event was addressed to.
        entity_id: EntityId,
        /// State the entity was in.
        state: LifecycleState,
        /// Rejected event.
        event: LifecycleEvent,
    },
}

/// Error returned while parsing lifecycle states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown lifecycle state: {0}")]
pub struct ParseLifecycleStateError(pub String);
