//! Exit executor configuration.

use serde::{Deserialize, Serialize};

use crate::domain::exit_execution::{ExitConfig, ExitConfirmation};

/// Exit executor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitSettings {
    /// `on_ack` or `on_fill`.
    #[serde(default)]
    pub confirmation: ExitConfirmation,
    /// How long an `on_fill` exit waits for its fill report.
    #[serde(default = "default_pending_timeout_secs")]
    pub pending_timeout_secs: u64,
    /// JSON lines file for exits the position store rejected. In-memory when unset.
    #[serde(default)]
    pub journal_path: Option<String>,
}

impl Default for ExitSettings {
    fn default() -> Self {
        Self {
            confirmation: ExitConfirmation::default(),
            pending_timeout_secs: default_pending_timeout_secs(),
            journal_path: None,
        }
    }
}

impl ExitSettings {
    /// Convert to the executor's configuration.
    #[must_use]
    pub fn to_exit_config(&self) -> ExitConfig {
        ExitConfig::default()
            .with_confirmation(self.confirmation)
            .with_pending_timeout(super::seconds(self.pending_timeout_secs))
    }
}

const fn default_pending_timeout_secs() -> u64 {
    30
}
