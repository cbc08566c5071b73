//! Exit Execution Errors

use thiserror::Error;

/// Errors the caller of the exit executor must handle.
///
/// Contention and broker rejections are reported as
/// [`ExitOutcome::Rejected`](super::ExitOutcome::Rejected) instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExitError {
    /// The position could not be read before submitting.
    #[error("Failed to load position {position_id}: {message}")]
    PositionLookupFailed {
        /// Position ID.
        position_id: String,
        /// Error details.
        message: String,
    },

    /// The broker confirmed the exit but the store rejected the update.
    #[error(
        "Exit of {position_id} confirmed but not persisted (journaled: {journaled}): {message}"
    )]
    StoreUpdateFailed {
        /// Position ID.
        position_id: String,
        /// Store error details.
        message: String,
        /// Whether the fallback journal accepted the record.
        journaled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ExitError::StoreUpdateFailed {
            position_id: "p-1".to_string(),
            message: "disk full".to_string(),
            journaled: true,
        };
        assert_eq!(
            err.to_string(),
            "Exit of p-1 confirmed but not persisted (journaled: true): disk full"
        );
    }
}
