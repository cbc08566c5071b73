//! Observability module for metrics.
//!
//! Counters for report matching, lot tracking, stop enforcement and exit
//! execution. They are no-ops until a host installs a recorder, for example
//! with [`init_metrics`].

mod metrics;

pub use metrics::{
    MetricsConfig, MetricsError, init_metrics, record_exit, record_exit_journaled,
    record_lot_fills, record_orders_expired, record_protective_update, record_report_matched,
    record_report_unmatched, record_retry_requested, record_tracker_completed,
    record_tracker_failed, record_trailing_activated, record_trigger,
};
