//! Lot Tracking Errors

use thiserror::Error;

use crate::domain::shared::TrackerId;

/// Errors raised by lot trackers and the lot manager.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LotError {
    /// A tracker with this id already exists.
    #[error("Lot tracker already exists: {0}")]
    DuplicateTracker(TrackerId),

    /// No tracker with this id.
    #[error("Lot tracker not found: {0}")]
    TrackerNotFound(TrackerId),

    /// Quantities must be positive.
    #[error("Invalid lot quantity for {field}: {value}")]
    InvalidQuantity {
        /// Offending field.
        field: &'static str,
        /// Offending value.
        value: u32,
    },
}
