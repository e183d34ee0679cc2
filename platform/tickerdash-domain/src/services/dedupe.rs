use crate::value_objects::symbol::Symbol;
use std::collections::HashSet;

/// Identity used when collapsing rows that show the same ticker at the same price.
pub fn symbol_price_key(symbol: &Symbol, price: f64) -> (Symbol, u64) {
    // -0.0 and 0.0 compare equal, so they must share a key.
    let bits = if price == 0.0 { 0u64 } else { price.to_bits() };
    (symbol.clone(), bits)
}

/// Keeps the first occurrence of every `(symbol, price)` pair, preserving order.
pub fn dedupe_by_symbol_price<T, F>(items: impl IntoIterator<Item = T>, key: F) -> Vec<T>
where
    F: Fn(&T) -> (&Symbol, f64),
{
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for item in items {
        let (symbol, price) = key(&item);
        if seen.insert(symbol_price_key(symbol, price)) {
            out.push(item);
        }
    }
    out
}
