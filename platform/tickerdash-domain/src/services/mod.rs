pub mod dedupe;
pub mod palette;
pub mod symbols;
pub mod time_format;
