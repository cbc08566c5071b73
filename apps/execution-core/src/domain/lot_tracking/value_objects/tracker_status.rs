//! Lot tracker status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Derived status of a lot tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackerStatus {
    /// Nothing filled yet.
    Pending,
    /// Some but not all lots filled.
    Partial,
    /// Target reached.
    Completed,
    /// Retries exhausted with quantity unfilled.
    Failed,
}

impl TrackerStatus {
    /// Completed and Failed trackers accept no further reports.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for TrackerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Partial => "PARTIAL",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}
