//! Match results and matcher statistics.

use serde::{Deserialize, Serialize};

use super::{MatchMode, PendingOrder};

/// Which rule resolved a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedBy {
    /// Cancel matched on product only.
    Product,
    /// Fill matched by pure time order.
    TimeOrder,
    /// Fill matched within the price tolerance.
    PriceTolerance,
}

/// Result of matching one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// The oldest compatible pending order, now resolved.
    Matched {
        /// The resolved order (status `Matched` or `Cancelled`).
        order: PendingOrder,
        /// Rule that matched.
        matched_by: MatchedBy,
    },
    /// Nothing compatible was pending.
    NoMatch,
}

impl MatchOutcome {
    /// The matched order, if any.
    #[must_use]
    pub const fn order(&self) -> Option<&PendingOrder> {
        match self {
            Self::Matched { order, .. } => Some(order),
            Self::NoMatch => None,
        }
    }

    /// True when a pending order was resolved.
    #[must_use]
    pub const fn is_match(&self) -> bool {
        matches!(self, Self::Matched { .. })
    }
}

/// Read-only matcher counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatcherStats {
    /// Orders registered.
    pub registered: u64,
    /// Fill reports matched.
    pub matched: u64,
    /// Fills matched by pure time order.
    pub matched_by_time_order: u64,
    /// Fills matched within price tolerance.
    pub matched_by_price: u64,
    /// Cancel reports matched.
    pub cancelled: u64,
    /// Orders evicted by the time window.
    pub expired: u64,
    /// Reports that matched nothing.
    pub unmatched: u64,
    /// Orders currently pending.
    pub pending: usize,
    /// Mode in force.
    #[serde(skip)]
    pub mode: MatchMode,
}
