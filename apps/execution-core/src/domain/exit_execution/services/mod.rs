//! Exit Execution Domain Services

mod exit_guard;

pub use exit_guard::{ExitGuard, ExitPermit};
