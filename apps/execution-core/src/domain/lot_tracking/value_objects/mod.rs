//! Lot Tracking Value Objects

mod fill_record;
mod outcomes;
mod tracker_config;
mod tracker_status;

pub use fill_record::FillRecord;
pub use outcomes::{CancelOutcome, FillOutcome, RetryRequest};
pub use tracker_config::LotTrackerConfig;
pub use tracker_status::TrackerStatus;
