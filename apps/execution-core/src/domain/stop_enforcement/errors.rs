//! Stop Enforcement Errors

use thiserror::Error;

use super::value_objects::StopLossType;

/// Errors that can occur during stop enforcement.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StopEnforcementError {
    /// Position not found in the store.
    #[error("Position not found: {position_id}")]
    PositionNotFound {
        /// The missing position ID.
        position_id: String,
    },

    /// Stop type may only move forward.
    #[error("Invalid stop transition for {position_id}: {from} -> {to}")]
    InvalidTransition {
        /// Position ID.
        position_id: String,
        /// Current stop type.
        from: StopLossType,
        /// Requested stop type.
        to: StopLossType,
    },

    /// Invalid stop rule configuration.
    #[error("Invalid stop rules: {message}")]
    InvalidRules {
        /// Error details.
        message: String,
    },

    /// The position store rejected a read or write.
    #[error("Position store error for {position_id}: {message}")]
    Store {
        /// Position ID (empty for bulk reads).
        position_id: String,
        /// Error details.
        message: String,
    },
}
