pub mod cache_store;
pub mod clock;
pub mod export;
pub mod feeds;
pub mod messaging;
