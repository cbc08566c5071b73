//! Stop Enforcement Bounded Context
//!
//! Per-position stop-loss state: initial stop at entry, trailing-stop
//! activation and peak tracking, drawdown exits, and protective stops derived
//! from the realized profit of sibling lots. Evaluation is pure; persistence
//! and fan-out live in the application layer.

pub mod errors;
pub mod events;
pub mod services;
pub mod value_objects;

pub use errors::StopEnforcementError;
pub use events::StopEvent;
pub use services::{Evaluation, StopStateMachine, TrailingUpdate, TriggerLedger};
pub use value_objects::{
    DrawdownTrigger, LotStopRule, OpeningRange, PositionDirection, PositionSnapshot,
    PositionStatus, StopLossTrigger, StopLossType, StopRules, Trigger,
};
