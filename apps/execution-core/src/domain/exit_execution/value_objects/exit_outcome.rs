//! Results of an exit attempt.

use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

use super::ExitReason;
use crate::domain::shared::{GroupId, OrderId, PositionId, Timestamp};
use crate::domain::stop_enforcement::PositionStatus;

/// A recorded exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitFill {
    /// Position.
    pub position_id: PositionId,
    /// Strategy group.
    pub group_id: GroupId,
    /// Exit order.
    pub order_id: OrderId,
    /// Exit reason.
    pub reason: ExitReason,
    /// Exit price.
    pub exit_price: Decimal,
    /// Realized P&L in points.
    pub realized_pnl: Decimal,
}

/// An exit submitted and waiting for its fill report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingExit {
    /// Position.
    pub position_id: PositionId,
    /// Strategy group.
    pub group_id: GroupId,
    /// Exit order.
    pub order_id: OrderId,
    /// Exit reason.
    pub reason: ExitReason,
    /// Submitted price.
    pub price: Decimal,
    /// Submission time.
    pub submitted_at: Timestamp,
}

/// Why an exit attempt did not go ahead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum ExitRejection {
    /// Another exit for the position is in flight.
    AlreadyExiting,
    /// The store has no such position.
    NotFound,
    /// The position is not ACTIVE.
    NotActive {
        /// Current status.
        status: PositionStatus,
    },
    /// No usable exit price.
    QuoteUnavailable {
        /// Error details.
        message: String,
    },
    /// The broker refused the exit order.
    BrokerRejected {
        /// Error details.
        message: String,
    },
    /// The exit order was cancelled or timed out before filling.
    Abandoned {
        /// Error details.
        message: String,
    },
    /// An earlier exit was confirmed but the store has not recorded it.
    Unpersisted,
}

impl fmt::Display for ExitRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyExiting => write!(f, "exit already in flight"),
            Self::NotFound => write!(f, "position not found"),
            Self::NotActive { status } => write!(f, "position is {status}"),
            Self::QuoteUnavailable { message } => write!(f, "quote unavailable: {message}"),
            Self::BrokerRejected { message } => write!(f, "broker rejected exit: {message}"),
            Self::Abandoned { message } => write!(f, "exit abandoned: {message}"),
            Self::Unpersisted => write!(f, "exit already confirmed, store update outstanding"),
        }
    }
}

/// Result of [`trigger_exit`](crate::application::services::ExitExecutor::trigger_exit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum ExitOutcome {
    /// The position is closed and recorded.
    Completed(ExitFill),
    /// The order is out; the fill report will finalize it.
    Pending(PendingExit),
    /// Nothing was closed.
    Rejected(ExitRejection),
}

impl ExitOutcome {
    /// Whether the exit was recorded.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether an exit order went to the broker.
    #[must_use]
    pub const fn was_submitted(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Pending(_))
    }

    /// The rejection, if any.
    #[must_use]
    pub const fn rejection(&self) -> Option<&ExitRejection> {
        match self {
            Self::Rejected(r) => Some(r),
            _ => None,
        }
    }

    /// Whether the attempt lost to an exit already in flight.
    #[must_use]
    pub const fn is_already_exiting(&self) -> bool {
        matches!(self, Self::Rejected(ExitRejection::AlreadyExiting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_helpers() {
        let outcome = ExitOutcome::Rejected(ExitRejection::AlreadyExiting);
        assert!(outcome.is_already_exiting());
        assert!(!outcome.was_submitted());
        assert_eq!(outcome.rejection().unwrap().to_string(), "exit already in flight");

        let outcome = ExitOutcome::Rejected(ExitRejection::NotActive {
            status: PositionStatus::Exited,
        });
        assert_eq!(outcome.rejection().unwrap().to_string(), "position is EXITED");
    }
}
