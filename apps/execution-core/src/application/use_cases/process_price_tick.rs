//! Process Price Tick Use Case

use rust_decimal::Decimal;
use std::sync::Arc;

use crate::application::ports::{BrokerPort, PositionStorePort};
use crate::application::services::{ExitExecutor, PositionStopService};
use crate::domain::exit_execution::{ExitError, ExitOutcome};
use crate::domain::shared::ProductCode;
use crate::domain::stop_enforcement::{StopEnforcementError, Trigger};

/// One trigger and what the executor did with it.
#[derive(Debug, Clone)]
pub struct TriggeredExit {
    /// The trigger.
    pub trigger: Trigger,
    /// Exit result.
    pub result: Result<ExitOutcome, ExitError>,
}

/// Result of processing one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Exits attempted for this tick's triggers.
    pub exits: Vec<TriggeredExit>,
}

impl TickReport {
    /// Exits that went to the broker.
    #[must_use]
    pub fn submitted(&self) -> usize {
        self.exits
            .iter()
            .filter(|e| e.result.as_ref().is_ok_and(ExitOutcome::was_submitted))
            .count()
    }
}

/// Use case for the market-data callback: tick → stops → exits.
pub struct ProcessPriceTickUseCase<B, S>
where
    B: BrokerPort,
    S: PositionStorePort,
{
    stops: Arc<PositionStopService<S>>,
    executor: Arc<ExitExecutor<B, S>>,
}

impl<B, S> ProcessPriceTickUseCase<B, S>
where
    B: BrokerPort,
    S: PositionStorePort,
{
    /// Create a new `ProcessPriceTickUseCase`.
    pub const fn new(
        stops: Arc<PositionStopService<S>>,
        executor: Arc<ExitExecutor<B, S>>,
    ) -> Self {
        Self { stops, executor }
    }

    /// Evaluate the tick and exit every triggered position.
    ///
    /// # Errors
    ///
    /// Returns [`StopEnforcementError`] if the positions cannot be read.
    /// Exit failures are reported per trigger in the [`TickReport`].
    pub async fn execute(
        &self,
        product: &ProductCode,
        price: Decimal,
    ) -> Result<TickReport, StopEnforcementError> {
        let triggers = self.stops.on_price_tick(product, price).await?;
        let mut report = TickReport::default();
        for trigger in triggers {
            let result = self.executor.handle_trigger(&trigger).await;
            if let Err(e) = &result {
                tracing::error!(
                    position_id = %trigger.position_id(),
                    error = %e,
                    "Exit for trigger failed"
                );
            }
            report.exits.push(TriggeredExit { trigger, result });
        }
        Ok(report)
    }
}
