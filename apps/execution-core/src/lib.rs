// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Execution Core - Rust Library
//!
//! In-memory coordination core of a futures trading bot. It sits between
//! the strategy, the broker's order gateway and the position store, and
//! keeps the position lifecycle race-free while broker reports and price
//! ticks arrive on independent threads.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects, domain events)
//!   - `order_matching`: FIFO matching of broker reports to pending orders
//!   - `lot_tracking`: Multi-lot entry aggregation and cancel-driven retries
//!   - `stop_enforcement`: Initial/trailing/protective stop state machine
//!   - `exit_execution`: Single-flight exit guard and exit outcomes
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: Interfaces for external systems (`BrokerPort`,
//!     `PositionStorePort`, `ExitJournalPort`)
//!   - `services`: `LotManager`, `PositionStopService`, `ExitExecutor`
//!   - `use_cases`: `ProcessPriceTick`, `ProcessBrokerReport`
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `broker`: Simulated order gateway
//!   - `persistence`: In-memory position store
//!   - `journal`: Unpersisted-exit journals
//!   - `config`: Dependency injection container
//!
//! # Concurrency
//!
//! Services are shared behind `Arc` and may be called from any thread. No
//! lock is held across a port call, and listeners run after locks are
//! released.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration loading and validation.
pub mod config;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports from Clean Architecture
// =============================================================================

// Domain re-exports
pub use domain::exit_execution::{
    ExitConfig, ExitConfirmation, ExitError, ExitEvent, ExitFill, ExitOutcome, ExitReason,
    ExitRejection, PendingExit, UnpersistedExit,
};
pub use domain::lot_tracking::{LotError, LotEvent, LotTracker, RetryRequest, TrackerStatus};
pub use domain::order_matching::{
    BrokerReport, MatchMode, MatchOutcome, MatcherConfig, MatchingError, OrderOwner,
    PendingOrder, ReportKind, ReportMatcher,
};
pub use domain::shared::{
    GroupId, OrderId, PositionId, ProductAliases, ProductCode, Side, Timestamp, TrackerId,
};
pub use domain::stop_enforcement::{
    LotStopRule, OpeningRange, PositionDirection, PositionSnapshot, StopEvent, StopLossType,
    StopRules, Trigger,
};

// Application re-exports
pub use application::ports::{
    BrokerError, BrokerPort, ExitJournalPort, OrderAck, PositionStorePort, StoreError,
    SubmitOrderRequest,
};
pub use application::services::{ExitExecutor, LotManager, PositionStopService, RouteOutcome};
pub use application::use_cases::{
    ProcessBrokerReportUseCase, ProcessPriceTickUseCase, ReportResult, TickReport,
};

// Infrastructure re-exports
pub use infrastructure::broker::SimulatedGateway;
pub use infrastructure::config::Container;
pub use infrastructure::journal::{FileExitJournal, InMemoryExitJournal};
pub use infrastructure::persistence::InMemoryPositionStore;
