//! Configuration infrastructure (dependency injection).

mod container;

pub use container::{Container, journal_from_settings};
