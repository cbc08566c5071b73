//! Dependency Injection Container
//!
//! Builds the shared matcher, lot manager, stop service, exit executor and
//! use cases from a [`Config`] and the host's adapters.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::application::ports::{BrokerPort, ExitJournalPort, PositionStorePort};
use crate::application::services::{ExitExecutor, LotManager, PositionStopService};
use crate::application::use_cases::{ProcessBrokerReportUseCase, ProcessPriceTickUseCase};
use crate::config::{Config, ConfigError, ExitSettings};
use crate::domain::order_matching::ReportMatcher;
use crate::domain::shared::{GroupId, PositionId, ProductCode};
use crate::domain::stop_enforcement::{
    OpeningRange, PositionDirection, PositionSnapshot, StopRules,
};
use crate::infrastructure::journal::{FileExitJournal, InMemoryExitJournal};

/// Dependency injection container.
///
/// Every component shares one [`ReportMatcher`], so entry and exit orders
/// are resolved against the same pending queue.
pub struct Container<B, S>
where
    B: BrokerPort + 'static,
    S: PositionStorePort + 'static,
{
    // Ports
    broker: Arc<B>,
    store: Arc<S>,
    journal: Arc<dyn ExitJournalPort>,

    // Services
    stop_rules: StopRules,
    matcher: Arc<ReportMatcher>,
    lots: Arc<LotManager>,
    stops: Arc<PositionStopService<S>>,
    executor: Arc<ExitExecutor<B, S>>,
}

impl<B, S> Container<B, S>
where
    B: BrokerPort + 'static,
    S: PositionStorePort + 'static,
{
    /// Wire all components.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the stop rules are invalid.
    pub fn new(
        config: &Config,
        broker: Arc<B>,
        store: Arc<S>,
        journal: Arc<dyn ExitJournalPort>,
    ) -> Result<Self, ConfigError> {
        let stop_rules = config
            .stops
            .to_stop_rules()
            .map_err(|e| ConfigError::ValidationError(format!("stops: {e}")))?;

        let matcher = Arc::new(ReportMatcher::new(config.matching.to_matcher_config()));
        let lots = Arc::new(LotManager::new(
            Arc::clone(&matcher),
            config.lots.to_lot_manager_config(),
        ));
        let stops = Arc::new(PositionStopService::new(
            Arc::clone(&store),
            config.matching.aliases(),
        ));
        let executor = Arc::new(ExitExecutor::new(
            Arc::clone(&broker),
            Arc::clone(&store),
            Arc::clone(&journal),
            Arc::clone(&matcher),
            Arc::clone(&stops),
            config.exit.to_exit_config(),
        ));

        tracing::debug!(
            lot_rules = stop_rules.rules().len(),
            confirmation = ?config.exit.confirmation,
            "Container wired"
        );

        Ok(Self {
            broker,
            store,
            journal,
            stop_rules,
            matcher,
            lots,
            stops,
            executor,
        })
    }

    /// Get the broker port.
    pub fn broker(&self) -> Arc<B> {
        Arc::clone(&self.broker)
    }

    /// Get the position store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Get the unpersisted-exit journal.
    pub fn journal(&self) -> Arc<dyn ExitJournalPort> {
        Arc::clone(&self.journal)
    }

    /// Get the shared report matcher.
    pub fn matcher(&self) -> Arc<ReportMatcher> {
        Arc::clone(&self.matcher)
    }

    /// Get the lot manager.
    pub fn lots(&self) -> Arc<LotManager> {
        Arc::clone(&self.lots)
    }

    /// Get the position stop service.
    pub fn stops(&self) -> Arc<PositionStopService<S>> {
        Arc::clone(&self.stops)
    }

    /// Get the exit executor.
    pub fn executor(&self) -> Arc<ExitExecutor<B, S>> {
        Arc::clone(&self.executor)
    }

    /// Get the configured stop rules.
    pub const fn stop_rules(&self) -> &StopRules {
        &self.stop_rules
    }

    /// Build a fresh ACTIVE position using the rule for `lot_index`.
    #[allow(clippy::too_many_arguments)]
    pub fn open_position(
        &self,
        id: PositionId,
        group_id: GroupId,
        lot_index: u32,
        product: ProductCode,
        direction: PositionDirection,
        entry_price: Decimal,
        range: OpeningRange,
    ) -> PositionSnapshot {
        PositionSnapshot::open(
            id,
            group_id,
            lot_index,
            product,
            direction,
            entry_price,
            range,
            self.stop_rules.rule_for(lot_index),
        )
    }

    /// Create the price tick use case.
    pub fn process_price_tick(&self) -> ProcessPriceTickUseCase<B, S> {
        ProcessPriceTickUseCase::new(Arc::clone(&self.stops), Arc::clone(&self.executor))
    }

    /// Create the broker report use case.
    pub fn process_broker_report(&self) -> ProcessBrokerReportUseCase<B, S> {
        ProcessBrokerReportUseCase::new(Arc::clone(&self.lots), Arc::clone(&self.executor))
    }
}

/// Journal for the configured exit settings: a JSON lines file when
/// `journal_path` is set, otherwise in memory.
pub fn journal_from_settings(settings: &ExitSettings) -> Arc<dyn ExitJournalPort> {
    match settings.journal_path.as_deref() {
        Some(path) if !path.is_empty() => Arc::new(FileExitJournal::new(path)),
        _ => Arc::new(InMemoryExitJournal::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::RouteOutcome;
    use crate::application::use_cases::ReportResult;
    use crate::config::load_config_from_string;
    use crate::domain::order_matching::{OrderOwner, PendingOrder};
    use crate::domain::shared::{Side, TrackerId};
    use crate::domain::stop_enforcement::StopLossType;
    use crate::infrastructure::broker::SimulatedGateway;
    use crate::infrastructure::persistence::InMemoryPositionStore;
    use crate::testing::wire;
    use rust_decimal_macros::dec;

    fn container(yaml: &str) -> Container<SimulatedGateway, InMemoryPositionStore> {
        let config = load_config_from_string(yaml).unwrap();
        Container::new(
            &config,
            Arc::new(SimulatedGateway::new()),
            Arc::new(InMemoryPositionStore::new()),
            journal_from_settings(&config.exit),
        )
        .unwrap()
    }

    #[test]
    fn lot_manager_and_executor_share_the_matcher() {
        let c = container("");
        assert!(Arc::ptr_eq(&c.matcher(), c.lots().matcher()));
    }

    #[test]
    fn invalid_rules_fail_wiring() {
        let mut config = Config::default();
        config.stops.lot_rules.clear();
        let result = Container::new(
            &config,
            Arc::new(SimulatedGateway::new()),
            Arc::new(InMemoryPositionStore::new()),
            Arc::new(InMemoryExitJournal::new()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn open_position_uses_configured_rule() {
        let c = container(
            r"
stops:
  lot_rules:
    - { activation_points: 10, pullback_ratio: 0.3 }
    - { activation_points: 25, pullback_ratio: 0.3, protective_multiplier: 3 }
",
        );
        let p = c.open_position(
            PositionId::new("p-2"),
            GroupId::new("g-1"),
            4,
            ProductCode::new("MXF"),
            PositionDirection::Short,
            dec!(20000),
            OpeningRange::new(dec!(20050), dec!(19950)),
        );
        assert_eq!(p.trailing_activation_points, dec!(25));
        assert_eq!(p.protective_multiplier, Some(dec!(3)));
        assert_eq!(p.stop_loss, dec!(20050));
        assert_eq!(p.stop_type, StopLossType::Initial);
    }

    #[test]
    fn journal_path_selects_file_journal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exits.jsonl");
        let settings = ExitSettings {
            journal_path: path.to_str().map(str::to_string),
            ..ExitSettings::default()
        };
        // Both variants are usable through the port
        let _file = journal_from_settings(&settings);
        let _memory = journal_from_settings(&ExitSettings::default());
    }

    #[tokio::test]
    async fn report_use_case_routes_lot_fills() {
        let c = container("");
        let lots = c.lots();
        let tracker = TrackerId::new("t-1");
        lots.create_tracker(tracker.clone(), 1, 3, Side::Buy, ProductCode::new("MXF"))
            .unwrap();
        lots.record_submission(
            &tracker,
            PendingOrder::new(OrderOwner::Unowned, "MXF", Side::Buy, 1, dec!(20000)),
        )
        .unwrap();

        let result = c
            .process_broker_report()
            .execute(&wire("D", "B", "MXFK4", "20001", "1"))
            .await
            .unwrap();
        assert!(matches!(
            result,
            ReportResult::Lot(RouteOutcome::Tracker { ref tracker_id, .. }) if *tracker_id == tracker
        ));
    }
}
