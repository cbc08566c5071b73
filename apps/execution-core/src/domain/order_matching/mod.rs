//! Order Matching Bounded Context
//!
//! Broker execution reports carry no reliable order identifier, so every
//! fill or cancel is tied back to a locally submitted order by time order,
//! product and quantity (optionally price).

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::MatchingError;
pub use services::ReportMatcher;
pub use value_objects::{
    BrokerReport, MatchMode, MatchOutcome, MatchedBy, MatcherConfig, MatcherStats, OrderOwner,
    PendingOrder, PendingOrderStatus, ReportKind,
};
