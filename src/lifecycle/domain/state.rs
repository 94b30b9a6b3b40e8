//! Lifecycle states and the events that move entities between them.

use super::{Countdown, CountdownDelay, DeathAction, EntityId, ParseLifecycleStateError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an entity.
///
/// ```text
/// PendingAutomatic -> CausePendingDeath -> DetailsPendingDeath -> Dead
///        |                   |                    ^     |
///        +-------------------+--> Dead            +-----+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Counting down towards an unattended automatic death.
    PendingAutomatic,
    /// A cause was recorded; counting down towards the final death.
    CausePendingDeath,
    /// Details were recorded; counting down towards the final death.
    DetailsPendingDeath,
    /// Terminal state.
    Dead,
}

/// External or timer event addressed to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A cause was supplied.
    CauseAdded,
    /// Details were supplied.
    DetailsAdded,
    /// The pending countdown elapsed.
    CountdownElapsed,
}

impl LifecycleEvent {
    /// Returns the canonical name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CauseAdded => "cause_added",
            Self::DetailsAdded => "details_added",
            Self::CountdownElapsed => "countdown_elapsed",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LifecycleState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingAutomatic => "pending_automatic",
            Self::CausePendingDeath => "cause_pending_death",
            Self::DetailsPendingDeath => "details_pending_death",
            Self::Dead => "dead",
        }
    }

    /// Returns `true` for the terminal state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Dead)
    }

    /// Returns the state reached by applying `event`, or `None` when the
    /// event is not accepted in this state.
    #[must_use]
    pub const fn next(self, event: LifecycleEvent) -> Option<Self> {
        match (self, event) {
            (Self::PendingAutomatic, LifecycleEvent::CauseAdded) => Some(Self::CausePendingDeath),
            (
                Self::CausePendingDeath | Self::DetailsPendingDeath,
                LifecycleEvent::DetailsAdded,
            ) => Some(Self::DetailsPendingDeath),
            (
                Self::PendingAutomatic | Self::CausePendingDeath | Self::DetailsPendingDeath,
                LifecycleEvent::CountdownElapsed,
            ) => Some(Self::Dead),
            _ => None,
        }
    }

    /// Returns `true` when `event` is accepted in this state.
    #[must_use]
    pub const fn accepts(self, event: LifecycleEvent) -> bool {
        self.next(event).is_some()
    }

    /// Returns the countdown an entity in this state waits on.
    ///
    /// Terminal entities have no countdown.
    #[must_use]
    pub const fn countdown(self, entity_id: EntityId) -> Option<Countdown> {
        match self {
            Self::PendingAutomatic => Some(Countdown {
                delay: CountdownDelay::Short,
                action: DeathAction::AutomaticDeath(entity_id),
            }),
            Self::CausePendingDeath => Some(Countdown {
                delay: CountdownDelay::Long,
                action: DeathAction::FinalDeath(entity_id),
            }),
            Self::DetailsPendingDeath => Some(Countdown {
                delay: CountdownDelay::Short,
                action: DeathAction::FinalDeath(entity_id),
            }),
            Self::Dead => None,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LifecycleState {
    type Error = ParseLifecycleStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "pending_automatic" => Ok(Self::PendingAutomatic),
            "cause_pending_death" => Ok(Self::CausePendingDeath),
            "details_pending_death" => Ok(Self::DetailsPendingDeath),
            "dead" => Ok(Self::Dead),
            _ => Err(ParseLifecycleStateError(value.to_owned())),
        }
    }
}
