//! Countdown settings used by the lifecycle service.

use crate::lifecycle::domain::{CauseText, CountdownDelay};
use std::time::Duration;

/// Default delay before an unattended or fully described entity dies.
pub const DEFAULT_SHORT_DELAY: Duration = Duration::from_secs(40);

/// Default delay after a cause is recorded.
pub const DEFAULT_LONG_DELAY: Duration = Duration::from_secs(400);

/// Delays and defaults applied to entity countdowns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// Delay for unattended deaths and after details are recorded.
    pub short_delay: Duration,
    /// Delay after a cause is recorded.
    pub long_delay: Duration,
    /// Cause recorded by unattended deaths.
    pub automatic_cause: CauseText,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            short_delay: DEFAULT_SHORT_DELAY,
            long_delay: DEFAULT_LONG_DELAY,
            automatic_cause: CauseText::automatic(),
        }
    }
}

impl LifecycleSettings {
    /// Creates settings with the given delays and the default automatic cause.
    #[must_use]
    pub fn new(short_delay: Duration, long_delay: Duration) -> Self {
        Self {
            short_delay,
            long_delay,
            automatic_cause: CauseText::automatic(),
        }
    }

    /// Replaces the cause recorded by unattended deaths.
    #[must_use]
    pub fn with_automatic_cause(mut self, cause: CauseText) -> Self {
        self.automatic_cause = cause;
        self
    }

    /// Resolves a countdown delay kind to its configured duration.
    #[must_use]
    pub const fn delay(&self, kind: CountdownDelay) -> Duration {
        match kind {
            CountdownDelay::Short => self.short_delay,
            CountdownDelay::Long => self.long_delay,
        }
    }
}
