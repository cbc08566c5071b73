//! Prometheus metrics for the execution core.
//!
//! # Example
//!
//! ```ignore
//! use execution_core::observability::{init_metrics, MetricsConfig};
//!
//! init_metrics(&MetricsConfig::default())?;
//! ```

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

use crate::domain::order_matching::MatchedBy;

/// Configuration for the metrics exporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsConfig {
    /// Address to bind the metrics HTTP listener.
    pub listen_addr: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 9090)),
        }
    }
}

impl MetricsConfig {
    /// Create a new metrics configuration with custom address.
    #[must_use]
    pub const fn with_addr(addr: SocketAddr) -> Self {
        Self { listen_addr: addr }
    }
}

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the exporter fails to start (e.g., port already in use
/// or a recorder is already installed).
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(config.listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(
        addr = %config.listen_addr,
        "Prometheus metrics exporter started"
    );

    Ok(())
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Report Matching Metrics
// ============================================================================

/// Record a report resolved to a pending order.
pub fn record_report_matched(matched_by: MatchedBy) {
    let by = match matched_by {
        MatchedBy::Product => "product",
        MatchedBy::TimeOrder => "time_order",
        MatchedBy::PriceTolerance => "price_tolerance",
    };
    counter!("report_matches_total", "matched_by" => by).increment(1);
}

/// Record a report no pending order matched.
pub fn record_report_unmatched() {
    counter!("report_unmatched_total").increment(1);
}

/// Record pending orders evicted by the window.
pub fn record_orders_expired(count: u64) {
    counter!("pending_orders_expired_total").increment(count);
}

// ============================================================================
// Lot Tracking Metrics
// ============================================================================

/// Record lots filled on a tracker.
pub fn record_lot_fills(lots: u64) {
    counter!("lot_fills_total").increment(lots);
}

/// Record a tracker reaching its target.
pub fn record_tracker_completed() {
    counter!("lot_trackers_total", "outcome" => "completed").increment(1);
}

/// Record a tracker giving up after its retry cap.
pub fn record_tracker_failed() {
    counter!("lot_trackers_total", "outcome" => "failed").increment(1);
}

/// Record a cancel-driven retry request.
pub fn record_retry_requested() {
    counter!("lot_retry_requests_total").increment(1);
}

// ============================================================================
// Stop Enforcement Metrics
// ============================================================================

/// Record a trailing stop arming.
pub fn record_trailing_activated() {
    counter!("trailing_activations_total").increment(1);
}

/// Record an exit trigger.
///
/// # Arguments
///
/// * `kind` - Trigger kind (`"drawdown"` or `"stop_loss"`)
pub fn record_trigger(kind: &str) {
    counter!("stop_triggers_total", "kind" => kind.to_string()).increment(1);
}

/// Record a protective stop update attempt.
pub fn record_protective_update(success: bool) {
    let status = if success { "updated" } else { "failed" };
    counter!("protective_stop_updates_total", "status" => status).increment(1);
}

// ============================================================================
// Exit Execution Metrics
// ============================================================================

/// Record an exit attempt outcome.
///
/// # Arguments
///
/// * `outcome` - `"completed"`, `"pending"`, `"rejected"` or `"already_exiting"`
pub fn record_exit(outcome: &str) {
    counter!("exits_total", "outcome" => outcome.to_string()).increment(1);
}

/// Record a confirmed exit the position store rejected.
pub fn record_exit_journaled(journaled: bool) {
    let journal = if journaled { "written" } else { "failed" };
    counter!("unpersisted_exits_total", "journal" => journal).increment(1);
}
