//! Application Layer
//!
//! The application layer wires the domain to the outside world.
//! It defines:
//!
//! - **Ports**: Interfaces for the broker gateway, position store and exit journal
//! - **Services**: Long-lived coordinators shared across callback threads
//! - **Use Cases**: Host entry points for price ticks and broker reports

pub mod listeners;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use listeners::Listeners;
pub use ports::*;
pub use services::*;
pub use use_cases::*;
