//! Free-text to ticker resolution.
//!
//! Exact alias hits win. Otherwise the closest alias key within
//! [`FUZZY_MAX_DISTANCE`] edits is used, and anything further away is taken
//! literally as an uppercase ticker guess.
//!
//! Ties at the minimum distance go to the alias that comes first in table
//! order, because the best match is only replaced on a strictly smaller
//! distance. Table order is insertion order, so the built-in list below is
//! part of the resolver's observable behavior.

use crate::value_objects::symbol::Symbol;
use std::collections::HashMap;

pub const FUZZY_MAX_DISTANCE: usize = 2;

const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("appl", "AAPL"),
    ("applt", "AAPL"),
    ("fb", "FB"),
    ("facebook", "FB"),
    ("meta", "FB"),
    ("googl", "GOOG"),
    ("google", "GOOG"),
    ("tsla", "TSLA"),
    ("pypl", "PYPL"),
    ("paypal", "PYPL"),
    ("msft", "MSFT"),
    ("microsoft", "MSFT"),
    ("amzn", "AMZN"),
    ("amazon", "AMZN"),
    ("nflx", "NFLX"),
    ("netflix", "NFLX"),
    ("intc", "INTC"),
    ("intel", "INTC"),
    ("dis", "DIS"),
    ("disney", "DIS"),
    ("nvda", "NVDA"),
    ("nvidia", "NVDA"),
    ("crm", "CRM"),
    ("salesforce", "CRM"),
    ("adbe", "ADBE"),
    ("adobe", "ADBE"),
];

/// Ordered alias table. Keys are stored lowercase and trimmed.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: Vec<(String, Symbol)>,
    index: HashMap<String, usize>,
}

impl AliasTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut table = Self::empty();
        for (alias, symbol) in BUILTIN_ALIASES {
            table.insert(alias, symbol);
        }
        table
    }

    /// Appends `extra` after the current entries. Keys already present are skipped.
    pub fn with_extra<I, A, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (A, S)>,
        A: AsRef<str>,
        S: AsRef<str>,
    {
        for (alias, symbol) in extra {
            self.insert(alias.as_ref(), symbol.as_ref());
        }
        self
    }

    /// Returns `false` when the key is empty or already mapped (first definition wins).
    pub fn insert(&mut self, alias: &str, symbol: &str) -> bool {
        let key = alias.trim().to_lowercase();
        if key.is_empty() || self.index.contains_key(&key) {
            return false;
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries
            .push((key, Symbol::new(symbol.trim().to_uppercase())));
        true
    }

    pub fn get(&self, key: &str) -> Option<&Symbol> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Symbol)> {
        self.entries.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionKind {
    Exact,
    Fuzzy { alias: String, distance: usize },
    Literal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub input: String,
    pub symbol: Symbol,
    pub kind: ResolutionKind,
}

#[derive(Debug, Clone)]
pub struct SymbolResolver {
    aliases: AliasTable,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self::new(AliasTable::builtin())
    }
}

impl SymbolResolver {
    pub fn new(aliases: AliasTable) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn resolve(&self, input: &str) -> Symbol {
        self.resolve_detailed(input).symbol
    }

    pub fn resolve_detailed(&self, input: &str) -> Resolution {
        let normalized = normalize(input);

        if let Some(symbol) = self.aliases.get(&normalized) {
            return Resolution {
                input: normalized,
                symbol: symbol.clone(),
                kind: ResolutionKind::Exact,
            };
        }

        let mut best: Option<(&str, &Symbol, usize)> = None;
        for (alias, symbol) in self.aliases.iter() {
            let distance = levenshtein(&normalized, alias);
            if distance > FUZZY_MAX_DISTANCE {
                continue;
            }
            let better = match best {
                Some((_, _, min)) => distance < min,
                None => true,
            };
            if better {
                best = Some((alias, symbol, distance));
            }
        }

        match best {
            Some((alias, symbol, distance)) => Resolution {
                symbol: symbol.clone(),
                kind: ResolutionKind::Fuzzy {
                    alias: alias.to_string(),
                    distance,
                },
                input: normalized,
            },
            None => Resolution {
                symbol: Symbol::new(normalized.to_uppercase()),
                kind: ResolutionKind::Literal,
                input: normalized,
            },
        }
    }
}

pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

/// Edit distance with unit cost for insert, delete and substitute.
/// Operates on `char`s, so multi-byte input counts one edit per character.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
