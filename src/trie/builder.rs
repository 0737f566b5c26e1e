//! Sparse trie builder
//!
//! Needles are inserted into a map-based trie that can grow freely. Once all
//! needles are registered, [`TrieBuilder::compress`] (see `compact.rs`)
//! consumes the builder and produces the immutable [`Automaton`].
//!
//! [`Automaton`]: super::automaton::Automaton

use super::automaton::Automaton;
use super::types::*;
use crate::alphabet::Symbol;
use crate::error::{Error, Result};
use rustc_hash::FxHashMap;

/// Builder for constructing an automaton from needles
pub struct TrieBuilder {
    /// Nodes in insertion order; index 0 is the root
    pub(super) nodes: Vec<TrieNode>,
    /// Per-node edge map (parallel to `nodes`)
    pub(super) children: Vec<FxHashMap<Symbol, NodeIndex>>,
    /// Needle ordinals ending at a node
    pub(super) needles: FxHashMap<NodeIndex, Vec<u32>>,
    pub(super) needle_count: u32,
    pub(super) config: MatchConfig,
}

impl TrieBuilder {
    /// Create a builder that will produce an exact-matching automaton
    pub fn new() -> Self {
        Self::with_config(MatchConfig::default())
    }

    /// Create a builder with the given error budgets
    pub fn with_config(config: MatchConfig) -> Self {
        Self {
            nodes: vec![TrieNode::root()],
            children: vec![FxHashMap::default()],
            needles: FxHashMap::default(),
            needle_count: 0,
            config,
        }
    }

    pub fn set_max_ambiguous(&mut self, max: u8) {
        self.config.max_ambiguous = max;
    }

    pub fn set_max_mismatches(&mut self, max: u8) {
        self.config.max_mismatches = max;
    }

    /// Register a needle
    ///
    /// The needle gets the next ordinal, which is what [`Hit::needle_index`]
    /// reports. A rejected needle leaves the builder untouched and does not
    /// consume an ordinal.
    pub fn add_needle(&mut self, needle: impl AsRef<[u8]>) -> Result<()> {
        let needle = needle.as_ref();
        let symbols = self.validate(needle)?;

        let mut node = NodeIndex::ROOT;
        for symbol in symbols {
            node = self.add_child(node, symbol);
        }

        self.nodes[node.get()].depth_and_hit.set_hit(true);
        self.needles.entry(node).or_default().push(self.needle_count);
        self.needle_count += 1;
        Ok(())
    }

    /// Register needles in order, stopping at the first invalid one
    pub fn add_needles<I, S>(&mut self, needles: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        for needle in needles {
            self.add_needle(needle)?;
        }
        Ok(())
    }

    /// Register needles and freeze the trie into an automaton
    pub fn add_needles_and_compress<I, S>(mut self, needles: I) -> Result<Automaton>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.add_needles(needles)?;
        Ok(self.compress())
    }

    /// Number of needles registered so far
    pub fn needle_count(&self) -> u32 {
        self.needle_count
    }

    /// Number of trie nodes, including the root
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn validate(&self, needle: &[u8]) -> Result<Vec<Symbol>> {
        let needle_index = self.needle_count;
        if needle.is_empty() {
            return Err(Error::EmptyNeedle { needle_index });
        }
        if needle.len() > MAX_DEPTH {
            return Err(Error::NeedleTooLong {
                needle_index,
                length: needle.len(),
                max: MAX_DEPTH,
            });
        }

        needle
            .iter()
            .enumerate()
            .map(|(position, &b)| {
                let symbol = Symbol::from(b);
                if symbol.is_valid_for_peptide() {
                    Ok(symbol)
                } else {
                    Err(Error::InvalidSymbol {
                        needle_index,
                        position,
                        character: char::from(b),
                    })
                }
            })
            .collect()
    }

    /// Return the child of `parent` along `symbol`, creating it if needed
    fn add_child(&mut self, parent: NodeIndex, symbol: Symbol) -> NodeIndex {
        if let Some(&child) = self.children[parent.get()].get(&symbol) {
            return child;
        }

        let depth = self.nodes[parent.get()].depth() + 1;
        let child = NodeIndex::new(self.nodes.len());
        self.nodes.push(TrieNode::new(symbol, depth));
        self.children.push(FxHashMap::default());
        self.children[parent.get()].insert(symbol, child);
        child
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_prefixes() {
        let mut builder = TrieBuilder::new();
        builder.add_needles(["PEPTIDE", "PEPTIDER", "PEP"]).unwrap();

        // root + P-E-P-T-I-D-E-R
        assert_eq!(builder.node_count(), 9);
        assert_eq!(builder.needle_count(), 3);
        assert_eq!(builder.needles.len(), 3);
    }

    #[test]
    fn test_duplicate_needles_share_node() {
        let mut builder = TrieBuilder::new();
        builder.add_needles(["ACD", "ACD"]).unwrap();

        assert_eq!(builder.node_count(), 4);
        let (_, ordinals) = builder.needles.iter().next().unwrap();
        assert_eq!(ordinals, &vec![0, 1]);
    }

    #[test]
    fn test_case_insensitive() {
        let mut builder = TrieBuilder::new();
        builder.add_needles(["acd", "ACD"]).unwrap();
        assert_eq!(builder.node_count(), 4);
    }

    #[test]
    fn test_invalid_symbol_reports_needle() {
        let mut builder = TrieBuilder::new();
        builder.add_needle("AAA").unwrap();

        let err = builder.add_needle("PEP*TIDE").unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSymbol {
                needle_index: 1,
                position: 3,
                character: '*'
            }
        );

        // Nothing was inserted and the ordinal was not consumed
        assert_eq!(builder.node_count(), 4);
        assert_eq!(builder.needle_count(), 1);
        builder.add_needle("CC").unwrap();
        assert_eq!(builder.needle_count(), 2);
    }

    #[test]
    fn test_wildcard_not_allowed_in_needle() {
        let mut builder = TrieBuilder::new();
        let err = builder.add_needle("A$").unwrap_err();
        assert!(matches!(err, Error::InvalidSymbol { position: 1, .. }));

        // Ambiguity classes are fine in needles
        builder.add_needle("BJZX").unwrap();
    }

    #[test]
    fn test_empty_and_long_needles_rejected() {
        let mut builder = TrieBuilder::new();
        assert_eq!(
            builder.add_needle(""),
            Err(Error::EmptyNeedle { needle_index: 0 })
        );

        let long = "A".repeat(MAX_DEPTH + 1);
        assert!(matches!(
            builder.add_needle(&long),
            Err(Error::NeedleTooLong { length: 128, .. })
        ));

        builder.add_needle("A".repeat(MAX_DEPTH)).unwrap();
        assert_eq!(builder.node_count(), MAX_DEPTH + 1);
    }

    #[test]
    fn test_add_needles_stops_at_first_error() {
        let mut builder = TrieBuilder::new();
        let err = builder.add_needles(["AC", "U", "DE"]).unwrap_err();
        assert!(matches!(err, Error::InvalidSymbol { needle_index: 1, .. }));
        assert_eq!(builder.needle_count(), 1);
    }
}
