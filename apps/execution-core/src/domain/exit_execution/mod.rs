//! Exit Execution Bounded Context
//!
//! Types for the single-flight exit path: reasons, outcomes, the per-position
//! guard, confirmation policy and the record written when a confirmed exit
//! cannot be persisted.

pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use errors::ExitError;
pub use events::ExitEvent;
pub use services::{ExitGuard, ExitPermit};
pub use value_objects::{
    ExitConfig, ExitConfirmation, ExitFill, ExitOutcome, ExitReason, ExitRejection,
    PendingExit, UnpersistedExit,
};
