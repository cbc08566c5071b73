//! In-memory exit journal.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::application::ports::{ExitJournalPort, JournalError};
use crate::domain::exit_execution::UnpersistedExit;

/// Keeps journaled exits in memory. Can be told to fail.
#[derive(Debug, Default)]
pub struct InMemoryExitJournal {
    entries: Mutex<Vec<UnpersistedExit>>,
    failing: AtomicBool,
}

impl InMemoryExitJournal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<UnpersistedExit> {
        self.entries.lock().clone()
    }

    /// Make subsequent records fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl ExitJournalPort for InMemoryExitJournal {
    async fn record(&self, entry: &UnpersistedExit) -> Result<(), JournalError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(JournalError::Io {
                message: "journal unavailable".to_string(),
            });
        }
        self.entries.lock().push(entry.clone());
        Ok(())
    }
}
