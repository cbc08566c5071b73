//! Order / position side.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of an order or a position.
///
/// A long position is opened with a `Buy` and closed with a `Sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    /// Buy / long.
    Buy,
    /// Sell / short.
    Sell,
}

impl Side {
    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Parse the broker's side flag (`B`/`S`, case-insensitive, prefix match).
    #[must_use]
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim().chars().next()?.to_ascii_uppercase() {
            'B' => Some(Self::Buy),
            'S' => Some(Self::Sell),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}
