//! Simulated order gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;

use crate::application::ports::{BrokerError, BrokerPort, OrderAck, SubmitOrderRequest};
use crate::domain::shared::{ProductAliases, ProductCode};

/// Gateway that records submissions and serves configured quotes.
///
/// Quotes are keyed by generic product, so `MXFK4` and `MXF` share one book.
#[derive(Debug, Default)]
pub struct SimulatedGateway {
    aliases: ProductAliases,
    quotes: RwLock<HashMap<ProductCode, (Decimal, Decimal)>>,
    submissions: Mutex<Vec<SubmitOrderRequest>>,
    rejection: RwLock<Option<String>>,
    submit_delay: RwLock<Option<Duration>>,
    sequence: AtomicU64,
}

impl SimulatedGateway {
    /// Create a gateway with no quotes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the best bid and ask for a product.
    pub fn set_quote(&self, product: impl Into<ProductCode>, bid: Decimal, ask: Decimal) {
        let key = product.into().generic(&self.aliases);
        self.quotes.write().insert(key, (bid, ask));
    }

    /// Reject every submission with `reason`.
    pub fn reject_submissions(&self, reason: impl Into<String>) {
        *self.rejection.write() = Some(reason.into());
    }

    /// Accept submissions again.
    pub fn accept_submissions(&self) {
        *self.rejection.write() = None;
    }

    /// Sleep before acknowledging each submission.
    pub fn set_submit_delay(&self, delay: Duration) {
        *self.submit_delay.write() = Some(delay);
    }

    /// Submissions received so far, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<SubmitOrderRequest> {
        self.submissions.lock().clone()
    }

    /// Number of submissions received.
    #[must_use]
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    fn quote(&self, product: &ProductCode) -> Result<(Decimal, Decimal), BrokerError> {
        self.quotes
            .read()
            .get(&product.generic(&self.aliases))
            .copied()
            .ok_or_else(|| BrokerError::QuoteUnavailable {
                product: product.to_string(),
            })
    }
}

#[async_trait]
impl BrokerPort for SimulatedGateway {
    async fn submit_order(&self, request: SubmitOrderRequest) -> Result<OrderAck, BrokerError> {
        let delay = *self.submit_delay.read();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.submissions.lock().push(request.clone());

        if let Some(reason) = self.rejection.read().clone() {
            return Err(BrokerError::OrderRejected { reason });
        }
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(OrderAck {
            client_order_id: request.client_order_id,
            broker_order_id: Some(format!("SIM{sequence:06}")),
        })
    }

    async fn get_best_bid(&self, product: &ProductCode) -> Result<Decimal, BrokerError> {
        self.quote(product).map(|(bid, _)| bid)
    }

    async fn get_best_ask(&self, product: &ProductCode) -> Result<Decimal, BrokerError> {
        self.quote(product).map(|(_, ask)| ask)
    }
}
