//! Application Use Cases
//!
//! Host entry points: one per inbound stream.

mod process_broker_report;
mod process_price_tick;

pub use process_broker_report::{
    ProcessBrokerReportUseCase, ReportProcessingError, ReportResult,
};
pub use process_price_tick::{ProcessPriceTickUseCase, TickReport, TriggeredExit};
