//! Position Store Port (Driven Port)
//!
//! Single-record accessors over the external position store. Only ACTIVE
//! positions are returned by the bulk reads.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::exit_execution::ExitReason;
use crate::domain::shared::{GroupId, PositionId};
use crate::domain::stop_enforcement::{PositionSnapshot, StopLossType};

/// Position store error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No such position.
    #[error("Position not found: {position_id}")]
    NotFound {
        /// Position ID.
        position_id: String,
    },

    /// The store refused the write.
    #[error("Write rejected: {message}")]
    WriteRejected {
        /// Error details.
        message: String,
    },

    /// The store could not be reached.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },
}

/// Port for position persistence.
#[async_trait]
pub trait PositionStorePort: Send + Sync {
    /// Read one position.
    async fn get_position(&self, id: &PositionId) -> Result<Option<PositionSnapshot>, StoreError>;

    /// Active positions of one strategy group, by lot index.
    async fn get_active_positions(
        &self,
        group_id: &GroupId,
    ) -> Result<Vec<PositionSnapshot>, StoreError>;

    /// All active positions.
    async fn get_all_active_positions(&self) -> Result<Vec<PositionSnapshot>, StoreError>;

    /// Set the stop price and the rule owning it.
    async fn update_stop_loss(
        &self,
        id: &PositionId,
        price: Decimal,
        stop_type: StopLossType,
    ) -> Result<(), StoreError>;

    /// Set the rule owning the stop without moving the stop price.
    async fn update_stop_type(
        &self,
        id: &PositionId,
        stop_type: StopLossType,
    ) -> Result<(), StoreError>;

    /// Set the trailing flag and peak.
    ///
    /// While trailing, the stored peak only moves in the position's favour;
    /// a peak worse than the stored one is ignored. The read and the write
    /// are one atomic step. Returns whether this call switched trailing on.
    async fn update_trailing(
        &self,
        id: &PositionId,
        activated: bool,
        peak: Option<Decimal>,
    ) -> Result<bool, StoreError>;

    /// Close the position.
    async fn mark_exited(
        &self,
        id: &PositionId,
        exit_price: Decimal,
        realized_pnl: Decimal,
        reason: &ExitReason,
    ) -> Result<(), StoreError>;
}
