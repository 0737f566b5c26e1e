//! Freeze a sparse trie into the breadth-first automaton layout
//!
//! The builder's nodes are re-laid out so that:
//! 1. Nodes appear in BFS order (root first, then depth 1, depth 2, ...)
//! 2. The children of each node occupy one contiguous run, sorted by symbol
//! 3. Every node carries its suffix link and the inherited has-hit flag

use super::automaton::{Automaton, follow};
use super::builder::TrieBuilder;
use super::types::*;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

impl TrieBuilder {
    /// Compact the trie and compute suffix links
    ///
    /// Consumes the builder, so no needle can be added afterwards and
    /// compaction happens exactly once.
    pub fn compress(self) -> Automaton {
        let TrieBuilder {
            nodes: sparse,
            children,
            mut needles,
            needle_count,
            config,
        } = self;

        let mut nodes: Vec<TrieNode> = Vec::with_capacity(sparse.len());
        let mut parents: Vec<NodeIndex> = Vec::with_capacity(sparse.len());
        let mut needles_bfs: FxHashMap<NodeIndex, Vec<u32>> = FxHashMap::default();
        needles_bfs.reserve(needles.len());

        // (sparse index, bfs index)
        let mut queue: VecDeque<(NodeIndex, NodeIndex)> = VecDeque::new();
        nodes.push(sparse[0]);
        parents.push(NodeIndex::ROOT);
        queue.push_back((NodeIndex::ROOT, NodeIndex::ROOT));

        while let Some((old, new)) = queue.pop_front() {
            if let Some(ordinals) = needles.remove(&old) {
                needles_bfs.insert(new, ordinals);
            }

            let mut kids: Vec<_> = children[old.get()].iter().map(|(&s, &c)| (s, c)).collect();
            kids.sort_unstable_by_key(|&(symbol, _)| symbol);

            let first_child = NodeIndex::new(nodes.len());
            let node = &mut nodes[new.get()];
            node.first_child = first_child;
            // At most one child per symbol, and there are fewer than 256 symbols
            node.nr_children = kids.len() as u8;

            for (_, child) in kids {
                let child_new = NodeIndex::new(nodes.len());
                nodes.push(sparse[child.get()]);
                parents.push(new);
                queue.push_back((child, child_new));
            }
        }
        debug_assert_eq!(nodes.len(), sparse.len());
        drop(children);

        compute_suffix_links(&mut nodes, &parents);

        let automaton = Automaton::from_parts(nodes, needles_bfs, needle_count, config);
        let stats = automaton.stats();
        log::debug!(
            "compacted trie: {} nodes, {} needles, {} hit nodes, max depth {}",
            stats.node_count,
            stats.needle_count,
            stats.hit_node_count,
            stats.max_depth
        );
        automaton
    }
}

/// Fill in suffix links and propagate has-hit along them
///
/// Nodes are processed in BFS order, so a node's parent and the whole suffix
/// chain of that parent (all strictly shallower) are already final.
fn compute_suffix_links(nodes: &mut [TrieNode], parents: &[NodeIndex]) {
    nodes[0].suffix = NodeIndex::ROOT;

    for i in 1..nodes.len() {
        let parent = parents[i];
        let suffix = if parent.is_root() {
            NodeIndex::ROOT
        } else {
            follow(nodes, nodes[parent.get()].suffix, nodes[i].edge)
        };

        let inherited = nodes[suffix.get()].has_hit();
        let node = &mut nodes[i];
        node.suffix = suffix;
        if inherited {
            node.depth_and_hit.set_hit(true);
        }
    }
}
