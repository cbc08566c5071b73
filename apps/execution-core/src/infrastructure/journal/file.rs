//! Append-only JSON lines journal.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::application::ports::{ExitJournalPort, JournalError};
use crate::domain::exit_execution::UnpersistedExit;

/// Writes one JSON object per line to a file, creating it on first use.
#[derive(Debug)]
pub struct FileExitJournal {
    path: PathBuf,
    // Serializes appends so concurrent records never interleave.
    write_lock: Mutex<()>,
}

impl FileExitJournal {
    /// Journal at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Journal file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back. A missing file reads as empty.
    ///
    /// # Errors
    ///
    /// Returns [`JournalError`] if the file cannot be read or a line does
    /// not decode.
    pub async fn read_all(&self) -> Result<Vec<UnpersistedExit>, JournalError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(&e)),
        };
        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| JournalError::Serialization {
                    message: e.to_string(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl ExitJournalPort for FileExitJournal {
    async fn record(&self, entry: &UnpersistedExit) -> Result<(), JournalError> {
        let mut line = serde_json::to_string(entry).map_err(|e| JournalError::Serialization {
            message: e.to_string(),
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(&e))?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| io_error(&e))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| io_error(&e))?;
        file.flush().await.map_err(|e| io_error(&e))?;

        tracing::warn!(
            position_id = %entry.position_id,
            path = %self.path.display(),
            "Journaled unpersisted exit"
        );
        Ok(())
    }
}

fn io_error(error: &std::io::Error) -> JournalError {
    JournalError::Io {
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exit_execution::ExitReason;
    use crate::domain::shared::{GroupId, OrderId, PositionId, Timestamp};
    use rust_decimal_macros::dec;

    fn entry(id: &str) -> UnpersistedExit {
        UnpersistedExit {
            position_id: PositionId::new(id),
            group_id: GroupId::new("g-1"),
            order_id: OrderId::new("o-1"),
            reason: ExitReason::TrailingStop,
            exit_price: dec!(22500),
            realized_pnl: dec!(50),
            error: "database is locked".to_string(),
            recorded_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn appends_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let journal = FileExitJournal::new(dir.path().join("nested").join("exits.jsonl"));
        assert!(journal.read_all().await.unwrap().is_empty());

        journal.record(&entry("p-1")).await.unwrap();
        journal.record(&entry("p-2")).await.unwrap();

        let entries = journal.read_all().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].position_id.as_str(), "p-1");
        assert_eq!(entries[1].reason, ExitReason::TrailingStop);

        let raw = std::fs::read_to_string(journal.path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }
}
