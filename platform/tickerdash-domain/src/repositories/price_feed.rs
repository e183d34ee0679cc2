use crate::value_objects::quote::PriceQuote;
use crate::value_objects::symbol::Symbol;
use async_trait::async_trait;

/// Current-price lookup. Transport and non-OK responses are errors; an
/// unknown ticker is an `Ok` quote without a price.
#[async_trait]
pub trait PriceFeed: Send + Sync {
    async fn current_price(&self, symbol: &Symbol) -> Result<PriceQuote, String>;
}
