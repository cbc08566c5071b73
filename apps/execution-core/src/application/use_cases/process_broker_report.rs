//! Process Broker Report Use Case

use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::{BrokerPort, PositionStorePort};
use crate::application::services::{ExitExecutor, LotManager, RouteOutcome};
use crate::domain::exit_execution::{ExitError, ExitOutcome};
use crate::domain::order_matching::{BrokerReport, MatchingError};
use crate::domain::shared::PositionId;

/// Errors from processing a raw broker report.
#[derive(Debug, Error)]
pub enum ReportProcessingError {
    /// The report text could not be decoded.
    #[error(transparent)]
    Malformed(#[from] MatchingError),

    /// Finalizing an exit failed.
    #[error(transparent)]
    Exit(#[from] ExitError),
}

/// What a report did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportResult {
    /// Routed within the lot manager (or dropped there).
    Lot(RouteOutcome),
    /// Resolved an exit order.
    Exit {
        /// Exiting position.
        position_id: PositionId,
        /// Outcome, when the report changed the exit.
        outcome: Option<ExitOutcome>,
    },
}

/// Use case for the broker-event callback: wire text → matcher → lot
/// tracker or exit executor.
pub struct ProcessBrokerReportUseCase<B, S>
where
    B: BrokerPort,
    S: PositionStorePort,
{
    lots: Arc<LotManager>,
    executor: Arc<ExitExecutor<B, S>>,
}

impl<B, S> ProcessBrokerReportUseCase<B, S>
where
    B: BrokerPort,
    S: PositionStorePort,
{
    /// Create a new `ProcessBrokerReportUseCase`.
    pub const fn new(lots: Arc<LotManager>, executor: Arc<ExitExecutor<B, S>>) -> Self {
        Self { lots, executor }
    }

    /// Decode and process one report line.
    ///
    /// # Errors
    ///
    /// Returns [`ReportProcessingError::Malformed`] for undecodable text and
    /// [`ReportProcessingError::Exit`] when a confirmed exit could not be
    /// persisted.
    pub async fn execute(&self, raw: &str) -> Result<ReportResult, ReportProcessingError> {
        let report = BrokerReport::parse(raw).inspect_err(|e| {
            tracing::warn!(error = %e, "Dropping malformed broker report");
        })?;
        self.execute_parsed(&report).await
    }

    /// Process an already decoded report.
    ///
    /// # Errors
    ///
    /// Same as [`execute`](Self::execute), minus decoding.
    pub async fn execute_parsed(
        &self,
        report: &BrokerReport,
    ) -> Result<ReportResult, ReportProcessingError> {
        match self.lots.route_parsed(report) {
            RouteOutcome::Exit {
                position_id,
                order,
                report,
            } => {
                let outcome = self
                    .executor
                    .on_exit_report(&position_id, &order, &report)
                    .await?;
                Ok(ReportResult::Exit {
                    position_id,
                    outcome,
                })
            }
            other => Ok(ReportResult::Lot(other)),
        }
    }
}
