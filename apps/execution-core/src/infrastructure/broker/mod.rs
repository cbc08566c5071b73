//! Broker Adapters
//!
//! The vendor API binding lives in the host process; this crate ships a
//! simulated gateway for tests and dry runs.

pub mod simulated;

pub use simulated::SimulatedGateway;
