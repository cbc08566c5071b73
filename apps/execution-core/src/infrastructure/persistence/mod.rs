//! Persistence Adapters
//!
//! Implementations of the position store port. Hosts plug their own
//! database-backed store in through the same port.

pub mod in_memory;

pub use in_memory::InMemoryPositionStore;
