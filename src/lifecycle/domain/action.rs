//! Terminal actions scheduled by entity countdowns.

use super::EntityId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal action run when a countdown elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "entity_id", rename_all = "snake_case")]
pub enum DeathAction {
    /// Nobody supplied a narrative: record the default cause and the time
    /// of death.
    AutomaticDeath(EntityId),
    /// The narrative is complete: record the time of death only.
    FinalDeath(EntityId),
}

impl DeathAction {
    /// Returns the entity the action applies to.
    #[must_use]
    pub const fn entity_id(self) -> EntityId {
        match self {
            Self::AutomaticDeath(entity_id) | Self::FinalDeath(entity_id) => entity_id,
        }
    }
}

impl fmt::Display for DeathAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AutomaticDeath(entity_id) => write!(f, "automatic death of {entity_id}"),
            Self::FinalDeath(entity_id) => write!(f, "final death of {entity_id}"),
        }
    }
}

/// Which configured delay a countdown uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountdownDelay {
    /// Used for unattended deaths and after details are recorded.
    Short,
    /// Used after a cause is recorded, leaving room for details.
    Long,
}

/// Countdown an entity waits on in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    /// Delay before the action fires.
    pub delay: CountdownDelay,
    /// Action run when the delay elapses.
    pub action: DeathAction,
}
