#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Price fetch rejected or returned a non-OK status.
    NetworkFailure(String),
    /// Lookup succeeded but carried no usable price (or the input was empty).
    SymbolNotFound(String),
    /// Durable cache could not be read or written. Logged, never surfaced by the cache itself.
    CachePersistFailure(String),
    /// Send/export attempted with nothing selected.
    EmptySelection,
    /// Messaging endpoint answered with a non-success status.
    SendRejected(String),
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::NetworkFailure(msg) => write!(f, "network failure: {msg}"),
            DashboardError::SymbolNotFound(symbol) if symbol.is_empty() => {
                write!(f, "symbol not found")
            }
            DashboardError::SymbolNotFound(symbol) => write!(f, "symbol not found: {symbol}"),
            DashboardError::CachePersistFailure(msg) => write!(f, "cache persistence: {msg}"),
            DashboardError::EmptySelection => write!(f, "select data first"),
            DashboardError::SendRejected(msg) => write!(f, "send rejected: {msg}"),
        }
    }
}

impl std::error::Error for DashboardError {}
