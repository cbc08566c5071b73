//! Broker execution report decoded from the comma-delimited wire format.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::order_matching::MatchingError;
use crate::domain::shared::{ProductCode, Side};

/// Field offsets of the broker's report line.
mod field {
    pub const KIND: usize = 2;
    pub const SIDE: usize = 6;
    pub const PRODUCT: usize = 8;
    pub const PRICE: usize = 11;
    pub const QUANTITY: usize = 20;
}

/// Kind of broker report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportKind {
    /// Order accepted by the exchange (`N`).
    New,
    /// Order cancelled (`C`).
    Cancel,
    /// Deal / fill (`D`).
    Fill,
    /// Any other code (amendments, errors); ignored by routing.
    Other(String),
}

impl ReportKind {
    /// Decode the wire type code.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "N" => Self::New,
            "C" => Self::Cancel,
            "D" => Self::Fill,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One decoded execution/cancel report.
///
/// Cancel reports are not required to carry a usable price or quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerReport {
    /// Report kind.
    pub kind: ReportKind,
    /// Side, when the broker supplied one.
    pub side: Option<Side>,
    /// Product code exactly as reported (specific contract).
    pub product: ProductCode,
    /// Reported price.
    pub price: Option<Decimal>,
    /// Reported quantity in contracts.
    pub quantity: Option<u32>,
}

impl BrokerReport {
    /// Build a fill report.
    #[must_use]
    pub fn fill(product: impl Into<ProductCode>, price: Decimal, quantity: u32) -> Self {
        Self {
            kind: ReportKind::Fill,
            side: None,
            product: product.into(),
            price: Some(price),
            quantity: Some(quantity),
        }
    }

    /// Build a cancel report carrying only the product.
    #[must_use]
    pub fn cancel(product: impl Into<ProductCode>) -> Self {
        Self {
            kind: ReportKind::Cancel,
            side: None,
            product: product.into(),
            price: None,
            quantity: None,
        }
    }

    /// Attach a side.
    #[must_use]
    pub const fn with_side(mut self, side: Side) -> Self {
        self.side = Some(side);
        self
    }

    /// Attach a price and quantity (used for cancels that do carry them).
    #[must_use]
    pub const fn with_price_quantity(mut self, price: Decimal, quantity: u32) -> Self {
        self.price = Some(price);
        self.quantity = Some(quantity);
        self
    }

    /// Decode a raw report line.
    ///
    /// # Errors
    ///
    /// Returns [`MatchingError::MalformedReport`] when the line is too short,
    /// the product is empty, or a fill lacks a numeric price/quantity.
    pub fn parse(raw: &str) -> Result<Self, MatchingError> {
        let malformed = |reason: &str| MatchingError::MalformedReport {
            reason: reason.to_string(),
            raw: raw.to_string(),
        };

        let fields: Vec<&str> = raw.split(',').map(str::trim).collect();
        if fields.len() <= field::QUANTITY {
            return Err(malformed("too few fields"));
        }

        let kind = ReportKind::from_code(fields[field::KIND]);
        let product = fields[field::PRODUCT];
        if product.is_empty() {
            return Err(malformed("empty product code"));
        }

        let price = Decimal::from_str(fields[field::PRICE]).ok();
        let quantity = fields[field::QUANTITY].parse::<u32>().ok();

        if kind == ReportKind::Fill {
            if price.is_none() {
                return Err(malformed("fill without price"));
            }
            if quantity.is_none_or(|q| q == 0) {
                return Err(malformed("fill without quantity"));
            }
        }

        Ok(Self {
            kind,
            side: Side::from_flag(fields[field::SIDE]),
            product: ProductCode::new(product),
            price,
            quantity: quantity.filter(|q| *q > 0),
        })
    }
}

impl FromStr for BrokerReport {
    type Err = MatchingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
