//! Application Ports (Driven)
//!
//! Interfaces for the external collaborators this core depends on.

mod broker_port;
mod exit_journal_port;
mod position_store_port;

pub use broker_port::{BrokerError, BrokerPort, OrderAck, SubmitOrderRequest};
pub use exit_journal_port::{ExitJournalPort, JournalError};
pub use position_store_port::{PositionStorePort, StoreError};
