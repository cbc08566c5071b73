//! Exit executor configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// When an exit is considered done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitConfirmation {
    /// Finalize on a successful submission acknowledgement, at the
    /// submitted price.
    #[default]
    OnAck,
    /// Hold the exit open until the matched fill report arrives.
    OnFill,
}

/// Exit executor settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitConfig {
    /// Confirmation policy.
    pub confirmation: ExitConfirmation,
    /// How long an `OnFill` exit may wait for its fill.
    pub pending_timeout: Duration,
}

impl ExitConfig {
    /// Default pending timeout in seconds.
    pub const DEFAULT_PENDING_TIMEOUT_SECS: i64 = 30;

    /// Set the confirmation policy.
    #[must_use]
    pub const fn with_confirmation(mut self, confirmation: ExitConfirmation) -> Self {
        self.confirmation = confirmation;
        self
    }

    /// Set the pending timeout.
    #[must_use]
    pub const fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = timeout;
        self
    }
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            confirmation: ExitConfirmation::default(),
            pending_timeout: Duration::seconds(Self::DEFAULT_PENDING_TIMEOUT_SECS),
        }
    }
}
