use serde::{Deserialize, Serialize};

/// Result of a current-price lookup. `price` is absent when the backend
/// could not resolve the ticker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

impl PriceQuote {
    pub fn with_price(symbol: impl Into<String>, price: f64) -> Self {
        Self {
            symbol: Some(symbol.into()),
            price: Some(price),
        }
    }

    pub fn missing(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            price: None,
        }
    }

    /// Zero, negative and non-finite prices count as "no price".
    pub fn usable_price(&self) -> Option<f64> {
        self.price.filter(|p| p.is_finite() && *p > 0.0)
    }
}
