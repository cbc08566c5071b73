//! Stop Enforcement Value Objects

mod position_direction;
mod position_snapshot;
mod stop_loss_type;
mod stop_rules;
mod trigger;

pub use position_direction::PositionDirection;
pub use position_snapshot::{OpeningRange, PositionSnapshot, PositionStatus};
pub use stop_loss_type::StopLossType;
pub use stop_rules::{LotStopRule, StopRules};
pub use trigger::{DrawdownTrigger, StopLossTrigger, Trigger};
