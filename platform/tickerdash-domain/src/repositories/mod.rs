pub mod cache_store;
pub mod clock;
pub mod export;
pub mod messaging;
pub mod price_feed;
