//! Order Matching Value Objects

mod broker_report;
mod match_outcome;
mod matcher_config;
mod pending_order;

pub use broker_report::{BrokerReport, ReportKind};
pub use match_outcome::{MatchOutcome, MatchedBy, MatcherStats};
pub use matcher_config::{MatchMode, MatcherConfig};
pub use pending_order::{OrderOwner, PendingOrder, PendingOrderStatus};
