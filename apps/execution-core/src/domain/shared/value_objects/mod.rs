//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod product;
mod side;
mod timestamp;

pub use identifiers::{GroupId, OrderId, PositionId, TrackerId};
pub use product::{ProductAliases, ProductCode};
pub use side::Side;
pub use timestamp::Timestamp;
