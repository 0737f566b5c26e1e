//! Per-search traversal state
//!
//! The automaton is shared and immutable; everything a search mutates lives
//! here. One `SearchState` drives one query at a time, and any number of
//! states may search the same automaton concurrently.

use super::types::*;
use crate::alphabet::Symbol;
use std::collections::VecDeque;

/// Alternate search path exploring one resolved ambiguity or assumed mismatch
///
/// A spawn is active while it sits in the queue or is being advanced. Once
/// dropped (budget exhausted or query consumed) it is retired for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    /// Next query symbol to consume
    pub(crate) cursor: usize,
    pub(crate) node: NodeIndex,
    pub(crate) ambiguous_left: u8,
    pub(crate) mismatches_left: u8,
    /// Depth the spawn may still lose through suffix fallbacks before its
    /// first substitution leaves the matched window
    pub(crate) prefix_loss_left: u8,
}

/// Traversal state for one query
#[derive(Debug, Default)]
pub struct SearchState {
    /// Valid query symbols; invalid characters are dropped on `set_query`
    pub(crate) query: Vec<Symbol>,
    /// Byte offset in the original haystack of each entry in `query`
    pub(crate) offsets: Vec<usize>,
    /// Next symbol for the master to consume
    pub(crate) cursor: usize,
    pub(crate) master: NodeIndex,
    pub(crate) hits: Vec<Hit>,
    pub(crate) spawns: VecDeque<Spawn>,
    /// Budgets in effect for the current query, fixed on the first search call
    pub(crate) budgets: Option<MatchConfig>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state ready to search `haystack`
    pub fn with_query(haystack: impl AsRef<[u8]>) -> Self {
        let mut state = Self::new();
        state.set_query(haystack);
        state
    }

    /// Reset the state for a new haystack
    ///
    /// Clears hits, returns the master to the root and drops pending spawns.
    /// Characters outside the alphabet are skipped; hit positions still refer
    /// to byte offsets in `haystack`.
    pub fn set_query(&mut self, haystack: impl AsRef<[u8]>) {
        let haystack = haystack.as_ref();

        self.query.clear();
        self.offsets.clear();
        for (offset, &b) in haystack.iter().enumerate() {
            let symbol = Symbol::from(b);
            if symbol.is_valid() {
                self.query.push(symbol);
                self.offsets.push(offset);
            }
        }

        self.cursor = 0;
        self.master = NodeIndex::ROOT;
        self.hits.clear();
        self.spawns.clear();
        self.budgets = None;
    }

    /// Hits produced by the last search call
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Move the hit buffer out, leaving it empty
    pub fn take_hits(&mut self) -> Vec<Hit> {
        std::mem::take(&mut self.hits)
    }

    /// Number of valid symbols in the current query
    pub fn query_len(&self) -> usize {
        self.query.len()
    }

    /// Spawns still waiting to be advanced
    pub fn pending_spawns(&self) -> usize {
        self.spawns.len()
    }

    /// True once the master and every spawn have consumed the query
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.query.len() && self.spawns.is_empty()
    }
}
