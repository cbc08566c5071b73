//! Exit Execution Value Objects

mod exit_config;
mod exit_outcome;
mod exit_reason;
mod unpersisted_exit;

pub use exit_config::{ExitConfig, ExitConfirmation};
pub use exit_outcome::{ExitFill, ExitOutcome, ExitRejection, PendingExit};
pub use exit_reason::ExitReason;
pub use unpersisted_exit::UnpersistedExit;
