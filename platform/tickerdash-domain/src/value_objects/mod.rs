pub mod color;
pub mod quote;
pub mod sample;
pub mod selection;
pub mod snapshot;
pub mod symbol;
