//! Lot Tracking Aggregates

mod lot_tracker;

pub use lot_tracker::LotTracker;
