//! Futures product codes.
//!
//! Broker reports quote the specific contract (`MXFK4`, `TXF202411`) or a
//! front-month alias (`MTX00`), while locally submitted orders usually carry
//! the generic code. Matching always compares the generic form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Longest generic product root on the exchange (`TXF`, `MXF`, `TMF`).
const MAX_ROOT_LEN: usize = 3;

/// A futures product code, normalized to uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductCode(String);

impl ProductCode {
    /// Create a product code. The value is trimmed and uppercased.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().trim().to_uppercase())
    }

    /// Get the code string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Alphabetic root of the code, at most three letters.
    ///
    /// `MXFK4` → `MXF`, `TXF202411` → `TXF`, `MTX00` → `MTX`, `TM0000` → `TM`.
    #[must_use]
    pub fn root(&self) -> &str {
        let alpha_len = self
            .0
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
            .map_or(self.0.len(), |(i, _)| i);
        &self.0[..alpha_len.min(MAX_ROOT_LEN)]
    }

    /// Generic (front-month independent) code after alias resolution.
    #[must_use]
    pub fn generic(&self, aliases: &ProductAliases) -> Self {
        let root = self.root();
        if root.is_empty() {
            return self.clone();
        }
        Self(aliases.resolve(root).to_string())
    }

    /// True when both codes name the same generic product.
    #[must_use]
    pub fn same_product(&self, other: &Self, aliases: &ProductAliases) -> bool {
        self.generic(aliases) == other.generic(aliases)
    }
}

impl fmt::Display for ProductCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Root → exchange code aliases used by [`ProductCode::generic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductAliases(BTreeMap<String, String>);

impl ProductAliases {
    /// Create an alias table from `(root, generic)` pairs.
    #[must_use]
    pub fn new<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into().to_uppercase(), v.into().to_uppercase()))
                .collect(),
        )
    }

    /// Empty table: every root maps to itself.
    #[must_use]
    pub fn none() -> Self {
        Self(BTreeMap::new())
    }

    /// Resolve a root to its generic code.
    #[must_use]
    pub fn resolve<'a>(&'a self, root: &'a str) -> &'a str {
        self.0.get(root).map_or(root, String::as_str)
    }
}

impl Default for ProductAliases {
    fn default() -> Self {
        Self::new([("TX", "TXF"), ("MTX", "MXF"), ("TM", "TMF")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("MXFK4", "MXF")]
    #[test_case("TXF202411", "TXF")]
    #[test_case("MTX00", "MTX")]
    #[test_case("TM0000", "TM")]
    #[test_case("txf", "TXF")]
    fn root_extraction(code: &str, root: &str) {
        assert_eq!(ProductCode::new(code).root(), root);
    }

    #[test_case("MTX00", "MXF")]
    #[test_case("MXFK4", "MXF")]
    #[test_case("TX00", "TXF")]
    #[test_case("TM0000", "TMF")]
    #[test_case("TXFL4", "TXF")]
    fn generic_with_default_aliases(code: &str, generic: &str) {
        let aliases = ProductAliases::default();
        assert_eq!(ProductCode::new(code).generic(&aliases).as_str(), generic);
    }

    #[test]
    fn front_month_alias_matches_contract_code() {
        let aliases = ProductAliases::default();
        assert!(ProductCode::new("MTX00").same_product(&ProductCode::new("MXFK4"), &aliases));
        assert!(!ProductCode::new("TX00").same_product(&ProductCode::new("MXFK4"), &aliases));
    }

    #[test]
    fn numeric_only_code_is_kept() {
        let aliases = ProductAliases::none();
        assert_eq!(ProductCode::new("2330").generic(&aliases).as_str(), "2330");
    }
}
