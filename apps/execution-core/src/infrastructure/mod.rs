//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer:
//!
//! - `persistence/`: In-memory position store
//! - `broker/`: Simulated order gateway
//! - `journal/`: Unpersisted-exit journals (JSON lines file, in-memory)
//! - `config/`: Dependency wiring

pub mod broker;
pub mod config;
pub mod journal;
pub mod persistence;
