//! Standardized exit reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a position was closed.
///
/// Free-form tags from triggers, schedulers and operators are folded into a
/// fixed set so exits can be aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ExitReason {
    /// Opening-range stop.
    InitialStop,
    /// Trailing stop or drawdown.
    TrailingStop,
    /// Stop raised by a sibling's profit.
    ProtectiveStop,
    /// Scheduled session close.
    EndOfDay,
    /// Operator request.
    Manual,
    /// Anything else, kept verbatim.
    Other(String),
}

impl ExitReason {
    /// Classify a reason tag.
    #[must_use]
    pub fn classify(tag: &str) -> Self {
        let normalized = tag.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if normalized.contains("initial") {
            Self::InitialStop
        } else if normalized.contains("trailing") || normalized.contains("drawdown") {
            Self::TrailingStop
        } else if normalized.contains("protective") {
            Self::ProtectiveStop
        } else if normalized.contains("end_of_day")
            || normalized.contains("eod")
            || normalized.contains("close_all")
        {
            Self::EndOfDay
        } else if normalized.contains("manual") {
            Self::Manual
        } else {
            Self::Other(tag.trim().to_string())
        }
    }

    /// Canonical tag.
    #[must_use]
    pub fn as_tag(&self) -> &str {
        match self {
            Self::InitialStop => "initial_stop",
            Self::TrailingStop => "trailing_stop",
            Self::ProtectiveStop => "protective_stop",
            Self::EndOfDay => "end_of_day",
            Self::Manual => "manual",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl From<&str> for ExitReason {
    fn from(tag: &str) -> Self {
        Self::classify(tag)
    }
}

impl From<String> for ExitReason {
    fn from(tag: String) -> Self {
        Self::classify(&tag)
    }
}

impl From<ExitReason> for String {
    fn from(reason: ExitReason) -> Self {
        reason.as_tag().to_string()
    }
}
