//! Broker Port (Driven Port)
//!
//! Order gateway of the futures broker: order submission and top-of-book
//! quotes. Reports come back separately as wire text.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::shared::{OrderId, ProductCode, Side};

/// Request to submit an order to the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOrderRequest {
    /// Client order ID.
    pub client_order_id: OrderId,
    /// Product to trade.
    pub product: ProductCode,
    /// Order side.
    pub side: Side,
    /// Limit price (zero for market).
    pub price: Decimal,
    /// Quantity in contracts.
    pub quantity: u32,
    /// Close (offset) an existing position rather than open a new one.
    pub close_position: bool,
}

impl SubmitOrderRequest {
    /// Create an opening order request.
    #[must_use]
    pub const fn open(
        client_order_id: OrderId,
        product: ProductCode,
        side: Side,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            client_order_id,
            product,
            side,
            price,
            quantity,
            close_position: false,
        }
    }

    /// Create a closing order request.
    #[must_use]
    pub const fn close(
        client_order_id: OrderId,
        product: ProductCode,
        side: Side,
        price: Decimal,
        quantity: u32,
    ) -> Self {
        Self {
            client_order_id,
            product,
            side,
            price,
            quantity,
            close_position: true,
        }
    }
}

/// Acknowledgment from broker after order submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    /// Client order ID echoed back.
    pub client_order_id: OrderId,
    /// Broker-assigned order reference, if any.
    pub broker_order_id: Option<String>,
}

/// Broker port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Connection error.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// No quote available for the product.
    #[error("No quote for {product}")]
    QuoteUnavailable {
        /// Product code.
        product: String,
    },

    /// Unknown error.
    #[error("Broker error: {message}")]
    Unknown {
        /// Error details.
        message: String,
    },
}

/// Port for broker interactions.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// Submit an order to the broker.
    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<OrderAck, BrokerError>;

    /// Best bid for a product.
    async fn get_best_bid(&self, product: &ProductCode) -> Result<Decimal, BrokerError>;

    /// Best ask for a product.
    async fn get_best_ask(&self, product: &ProductCode) -> Result<Decimal, BrokerError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn close_request_sets_flag() {
        let request = SubmitOrderRequest::close(
            OrderId::new("o-1"),
            ProductCode::new("MXF"),
            Side::Sell,
            dec!(22000),
            1,
        );
        assert!(request.close_position);

        let request = SubmitOrderRequest::open(
            OrderId::new("o-2"),
            ProductCode::new("MXF"),
            Side::Buy,
            Decimal::ZERO,
            3,
        );
        assert!(!request.close_position);
    }

    #[test]
    fn broker_error_display() {
        let err = BrokerError::QuoteUnavailable {
            product: "MXF".to_string(),
        };
        assert_eq!(err.to_string(), "No quote for MXF");
    }
}
