//! Order Matching Errors

use thiserror::Error;

/// Errors raised while decoding broker reports.
///
/// A report that decodes but matches nothing is not an error; see
/// [`MatchOutcome::NoMatch`](super::MatchOutcome::NoMatch).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchingError {
    /// The wire report is missing fields or has unparseable values.
    #[error("Malformed broker report ({reason}): {raw}")]
    MalformedReport {
        /// What was wrong.
        reason: String,
        /// The raw report text.
        raw: String,
    },
}
