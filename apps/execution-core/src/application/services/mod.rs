//! Application Services
//!
//! Long-lived coordinators shared by the price-tick, broker-report and
//! maintenance threads of the host.

mod exit_executor;
mod lot_manager;
mod stop_service;

pub use exit_executor::ExitExecutor;
pub use lot_manager::{LotManager, LotManagerConfig, LotManagerStats, RouteOutcome};
pub use stop_service::{PositionStopService, ProtectiveReport};
