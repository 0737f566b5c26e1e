//! Types shared by the trie builder, the compacted automaton and search state

use crate::alphabet::Symbol;
use serde::{Deserialize, Serialize};

/// Deepest node a trie may contain (depth is stored in 7 bits)
pub const MAX_DEPTH: usize = 127;

/// Index of a node in the trie's node array (defaults to the root)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);
    pub const INVALID: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub(crate) fn new(i: usize) -> Self {
        debug_assert!(i < u32::MAX as usize, "node array overflow");
        NodeIndex(i as u32)
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    #[inline]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

/// Node depth (low 7 bits) and the has-hit flag (high bit) in one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DepthAndHit(u8);

impl DepthAndHit {
    const HIT_BIT: u8 = 0x80;

    pub fn new(depth: u8) -> Self {
        debug_assert!(depth as usize <= MAX_DEPTH);
        Self(depth & !Self::HIT_BIT)
    }

    #[inline]
    pub fn depth(self) -> u8 {
        self.0 & !Self::HIT_BIT
    }

    #[inline]
    pub fn has_hit(self) -> bool {
        self.0 & Self::HIT_BIT != 0
    }

    #[inline]
    pub fn set_hit(&mut self, hit: bool) {
        if hit {
            self.0 |= Self::HIT_BIT;
        } else {
            self.0 &= !Self::HIT_BIT;
        }
    }
}

/// A single trie node
///
/// `first_child` and `nr_children` are only meaningful after compaction,
/// when each node's children occupy `first_child..first_child + nr_children`.
#[derive(Debug, Clone, Copy)]
pub struct TrieNode {
    /// Longest proper suffix that is also a trie path (root for depth 1)
    pub suffix: NodeIndex,
    pub first_child: NodeIndex,
    pub nr_children: u8,
    /// Symbol on the edge from the parent
    pub edge: Symbol,
    pub depth_and_hit: DepthAndHit,
}

impl TrieNode {
    pub fn new(edge: Symbol, depth: u8) -> Self {
        Self {
            suffix: NodeIndex::ROOT,
            first_child: NodeIndex::INVALID,
            nr_children: 0,
            edge,
            depth_and_hit: DepthAndHit::new(depth),
        }
    }

    pub fn root() -> Self {
        Self::new(Symbol::INVALID, 0)
    }

    #[inline]
    pub fn depth(&self) -> u8 {
        self.depth_and_hit.depth()
    }

    #[inline]
    pub fn has_hit(&self) -> bool {
        self.depth_and_hit.has_hit()
    }
}

/// One occurrence of a needle in a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hit {
    /// Ordinal of the needle, in registration order
    pub needle_index: u32,
    /// Number of symbols in the needle
    pub needle_length: u32,
    /// Byte offset in the original haystack of the first matched symbol
    pub query_start: usize,
}

impl Hit {
    pub fn new(needle_index: u32, needle_length: u32, query_start: usize) -> Self {
        Self {
            needle_index,
            needle_length,
            query_start,
        }
    }
}

/// Error budgets applied to every reported hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Ambiguous query symbols (B, J, Z, X, $) that may be resolved to a concrete residue
    pub max_ambiguous: u8,
    /// Positions that may differ outright from the needle
    pub max_mismatches: u8,
}

impl MatchConfig {
    pub fn new(max_ambiguous: u8, max_mismatches: u8) -> Self {
        Self {
            max_ambiguous,
            max_mismatches,
        }
    }

    /// True when neither budget is set and matching is exact
    pub fn is_exact(&self) -> bool {
        self.max_ambiguous == 0 && self.max_mismatches == 0
    }
}

/// Statistics about a compacted automaton
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutomatonStats {
    pub node_count: usize,
    pub needle_count: u32,
    /// Nodes whose suffix chain reaches at least one needle end
    pub hit_node_count: usize,
    pub max_depth: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_and_hit_packing() {
        let mut dh = DepthAndHit::new(127);
        assert_eq!(dh.depth(), 127);
        assert!(!dh.has_hit());

        dh.set_hit(true);
        assert_eq!(dh.depth(), 127);
        assert!(dh.has_hit());

        dh.set_hit(false);
        assert!(!dh.has_hit());
        assert_eq!(dh.depth(), 127);
    }

    #[test]
    fn test_node_is_small() {
        assert!(std::mem::size_of::<TrieNode>() <= 12);
        assert_eq!(std::mem::size_of::<DepthAndHit>(), 1);
    }

    #[test]
    fn test_node_index_sentinels() {
        assert!(NodeIndex::ROOT.is_valid());
        assert!(NodeIndex::ROOT.is_root());
        assert!(!NodeIndex::INVALID.is_valid());
        assert_ne!(NodeIndex::ROOT, NodeIndex::INVALID);
    }

    #[test]
    fn test_match_config_serde() {
        let config = MatchConfig::new(3, 1);
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"max_ambiguous":3,"max_mismatches":1}"#);
        let back: MatchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
        assert!(MatchConfig::default().is_exact());
    }
}
