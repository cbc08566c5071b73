//! Pending (submitted, not yet resolved) order.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{OrderId, PositionId, ProductCode, Side, Timestamp, TrackerId};

/// Lifecycle of a pending order inside the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PendingOrderStatus {
    /// Waiting for a broker report.
    Pending,
    /// Resolved by a fill report.
    Matched,
    /// Resolved by a cancel report.
    Cancelled,
}

/// Which local component a pending order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderOwner {
    /// Entry order of a lot tracker.
    Lot(TrackerId),
    /// Exit order of a position.
    Exit(PositionId),
    /// Registered without an owner.
    Unowned,
}

/// One locally submitted order awaiting a broker report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOrder {
    /// Local identifier.
    pub id: OrderId,
    /// Owning component.
    pub owner: OrderOwner,
    /// Product as submitted.
    pub product: ProductCode,
    /// Order side.
    pub side: Side,
    /// Quantity in contracts.
    pub quantity: u32,
    /// Submitted price (zero for market orders).
    pub price: Decimal,
    /// Submission time; the FIFO key.
    pub submitted_at: Timestamp,
    /// Current status.
    pub status: PendingOrderStatus,
}

impl PendingOrder {
    /// Create a pending order submitted now.
    #[must_use]
    pub fn new(
        owner: OrderOwner,
        product: impl Into<ProductCode>,
        side: Side,
        quantity: u32,
        price: Decimal,
    ) -> Self {
        Self {
            id: OrderId::generate(),
            owner,
            product: product.into(),
            side,
            quantity,
            price,
            submitted_at: Timestamp::now(),
            status: PendingOrderStatus::Pending,
        }
    }

    /// Override the identifier (e.g. with the gateway's order id).
    #[must_use]
    pub fn with_id(mut self, id: OrderId) -> Self {
        self.id = id;
        self
    }

    /// Override the submission time.
    #[must_use]
    pub const fn submitted_at(mut self, at: Timestamp) -> Self {
        self.submitted_at = at;
        self
    }

    /// True while the order is unresolved.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == PendingOrderStatus::Pending
    }
}
