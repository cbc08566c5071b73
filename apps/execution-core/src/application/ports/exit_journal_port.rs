//! Exit Journal Port (Driven Port)
//!
//! Secondary record of exits the position store did not accept.

use async_trait::async_trait;

use crate::domain::exit_execution::UnpersistedExit;

/// Journal error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JournalError {
    /// Writing failed.
    #[error("Journal I/O error: {message}")]
    Io {
        /// Error details.
        message: String,
    },

    /// Encoding failed.
    #[error("Journal serialization error: {message}")]
    Serialization {
        /// Error details.
        message: String,
    },
}

/// Port for the unpersisted-exit journal.
#[async_trait]
pub trait ExitJournalPort: Send + Sync {
    /// Append one record.
    async fn record(&self, entry: &UnpersistedExit) -> Result<(), JournalError>;
}
