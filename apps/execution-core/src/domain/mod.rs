//! Domain Layer
//!
//! Business rules with no I/O. Locking is limited to the in-memory
//! structures that must be shared across callback threads (the matcher
//! queue, the trigger ledger and the exit guard).
//!
//! # Bounded Contexts
//!
//! - [`order_matching`]: FIFO matching of broker reports to pending orders
//! - [`lot_tracking`]: Fill/cancel accounting and retries for multi-lot entries
//! - [`stop_enforcement`]: Initial, trailing and protective stop state
//! - [`exit_execution`]: Single-flight exit types and guard

pub mod exit_execution;
pub mod lot_tracking;
pub mod order_matching;
pub mod shared;
pub mod stop_enforcement;
