//! Lot Tracking Bounded Context
//!
//! Aggregates fills and cancels for one multi-lot entry request against its
//! target quantity, and decides when a cancelled remainder should be retried.

pub mod aggregate;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use aggregate::LotTracker;
pub use errors::LotError;
pub use events::LotEvent;
pub use value_objects::{
    CancelOutcome, FillOutcome, FillRecord, LotTrackerConfig, RetryRequest, TrackerStatus,
};
