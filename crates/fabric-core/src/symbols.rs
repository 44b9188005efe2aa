use std::collections::{BTreeMap, HashSet};

use crate::pattern::{Pattern, UnitId};

/// Maps a pattern back to a human-readable label.
///
/// Supplied by the language/relation layer; the memory controller uses it
/// only for diagnostics.
pub trait SymbolLookup {
    fn symbol_for(&self, pattern: &Pattern) -> Option<String>;
}

/// Symbol key → pattern. Rebinding a key replaces its pattern wholesale.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    entries: BTreeMap<String, Pattern>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store or overwrite. Returns the pattern previously bound to the key.
    pub fn bind(&mut self, symbol: &str, pattern: Pattern) -> Option<Pattern> {
        self.entries.insert(symbol.to_string(), pattern)
    }

    pub fn recall(&self, symbol: &str) -> Option<&Pattern> {
        self.entries.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pattern)> {
        self.entries.iter().map(|(k, p)| (k.as_str(), p))
    }

    /// Every unit id referenced by any bound pattern.
    pub fn used_ids(&self) -> HashSet<UnitId> {
        self.entries.values().flat_map(|p| p.iter()).collect()
    }
}

/// Exact-match reverse lookup. When several keys share a pattern the
/// lexicographically first wins.
impl SymbolLookup for SymbolTable {
    fn symbol_for(&self, pattern: &Pattern) -> Option<String> {
        self.entries
            .iter()
            .find(|(_, p)| *p == pattern)
            .map(|(k, _)| k.clone())
    }
}
