//! Stop Enforcement Domain Services

mod stop_state_machine;
mod trigger_ledger;

pub use stop_state_machine::{Evaluation, StopStateMachine, TrailingUpdate};
pub use trigger_ledger::TriggerLedger;
