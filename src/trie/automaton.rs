//! Compacted Aho-Corasick automaton and the matching engine
//!
//! ## Exact matching
//!
//! The master path follows the query symbol by symbol: take the direct child
//! if there is one, otherwise fall back along suffix links. After every step
//! the suffix chain is walked while nodes carry the has-hit flag, reporting
//! every needle that ends at the current query position.
//!
//! ## Approximate matching
//!
//! When the master (or a spawn) consumes an ambiguous symbol with ambiguous
//! budget left, or any symbol with mismatch budget left, it starts spawns:
//! alternate paths that pretend the query contained a different residue at
//! that position. Spawns are queued on the [`SearchState`] and drained one at
//! a time, each to completion, after the master has finished.
//!
//! A spawn only reports hits whose window still contains its first
//! substitution. The remaining room is tracked as `prefix_loss_left`:
//! falling back along a suffix link shortens the window from the left, and
//! once the substituted position drops out the spawn can only rediscover
//! hits that a cheaper path already reports, so it retires.

use super::state::{SearchState, Spawn};
use super::types::*;
use crate::alphabet::{Symbol, SymbolRange};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// Immutable multi-pattern automaton
///
/// Built by [`TrieBuilder::compress`](super::builder::TrieBuilder::compress).
/// Searching only needs `&self`, so one automaton can serve many threads.
pub struct Automaton {
    /// Nodes in BFS order with contiguous children
    nodes: Vec<TrieNode>,
    /// Needle ordinals ending at a node
    needles: FxHashMap<NodeIndex, Vec<u32>>,
    needle_count: u32,
    config: MatchConfig,
}

/// Where new spawns branch off from
struct SpawnOrigin {
    node: NodeIndex,
    depth: u8,
    /// `None` for the master, which has no substitution to keep in view
    prefix_loss_left: Option<u8>,
    ambiguous_left: u8,
    mismatches_left: u8,
}

/// Mutable parts of a [`SearchState`] the engine writes to while stepping
struct Sink<'s> {
    offsets: &'s [usize],
    query_len: usize,
    hits: &'s mut Vec<Hit>,
    spawns: &'s mut VecDeque<Spawn>,
}

impl Automaton {
    pub(super) fn from_parts(
        nodes: Vec<TrieNode>,
        needles: FxHashMap<NodeIndex, Vec<u32>>,
        needle_count: u32,
        config: MatchConfig,
    ) -> Self {
        Self {
            nodes,
            needles,
            needle_count,
            config,
        }
    }

    /// Allowed ambiguous symbols per hit
    ///
    /// Must not be changed while a [`SearchState`] is mid-search; call
    /// [`SearchState::set_query`] again afterwards.
    pub fn set_max_ambiguous(&mut self, max: u8) {
        self.config.max_ambiguous = max;
    }

    /// Allowed mismatches per hit (same restrictions as [`Self::set_max_ambiguous`])
    pub fn set_max_mismatches(&mut self, max: u8) {
        self.config.max_mismatches = max;
    }

    pub fn config(&self) -> MatchConfig {
        self.config
    }

    pub fn needle_count(&self) -> u32 {
        self.needle_count
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes in BFS order
    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    /// Needle ordinals that end exactly at `node`
    pub fn needles_at(&self, node: NodeIndex) -> Option<&[u32]> {
        self.needles.get(&node).map(Vec::as_slice)
    }

    /// Direct child of `node` along `symbol`
    pub fn find_child(&self, node: NodeIndex, symbol: Symbol) -> Option<NodeIndex> {
        find_child(&self.nodes, node, symbol)
    }

    /// Transition function: child, else the suffix chain, else root
    pub fn follow(&self, node: NodeIndex, symbol: Symbol) -> NodeIndex {
        follow(&self.nodes, node, symbol)
    }

    /// Get statistics about this automaton
    pub fn stats(&self) -> AutomatonStats {
        AutomatonStats {
            node_count: self.nodes.len(),
            needle_count: self.needle_count,
            hit_node_count: self.nodes.iter().filter(|n| n.has_hit()).count(),
            max_depth: self.nodes.iter().map(TrieNode::depth).max().unwrap_or(0),
        }
    }

    /// Find every hit in `haystack` in one call
    pub fn find_all(&self, haystack: impl AsRef<[u8]>) -> Vec<Hit> {
        let mut state = SearchState::with_query(haystack);
        self.get_all_hits(&mut state);
        state.take_hits()
    }

    /// Advance the search until at least one hit is found
    ///
    /// Clears `state.hits()` first. Returns `true` with the new hits in the
    /// buffer, or `false` once the query is exhausted. Each call resumes
    /// exactly where the previous one stopped.
    ///
    /// # Panics
    ///
    /// If the automaton's budgets were changed since this query started.
    pub fn next_hits(&self, state: &mut SearchState) -> bool {
        self.check_budgets(state);
        state.hits.clear();
        self.advance(state)
    }

    /// Collect all remaining hits into `state.hits()`
    ///
    /// # Panics
    ///
    /// Same as [`Self::next_hits`].
    pub fn get_all_hits(&self, state: &mut SearchState) {
        self.check_budgets(state);
        state.hits.clear();
        while self.advance(state) {}
    }

    fn check_budgets(&self, state: &mut SearchState) {
        match state.budgets {
            None => state.budgets = Some(self.config),
            Some(budgets) => assert_eq!(
                budgets, self.config,
                "error budgets changed during an active search; call set_query to restart"
            ),
        }
    }

    /// Run the master, then the spawn queue, until the hit buffer grows
    fn advance(&self, state: &mut SearchState) -> bool {
        let SearchState {
            query,
            offsets,
            cursor,
            master,
            hits,
            spawns,
            budgets,
        } = state;
        let budgets = budgets.unwrap_or(self.config);
        let before = hits.len();
        let mut sink = Sink {
            offsets,
            query_len: query.len(),
            hits,
            spawns,
        };

        while *cursor < query.len() {
            let pos = *cursor;
            *master = self.step_master(*master, query[pos], pos, budgets, &mut sink);
            *cursor += 1;
            self.collect_hits(*master, None, pos, &mut sink);
            if sink.hits.len() > before {
                return true;
            }
        }

        while let Some(mut spawn) = sink.spawns.pop_front() {
            while spawn.cursor < query.len() {
                let edge = query[spawn.cursor];
                let active = self.follow_spawn(&mut spawn, edge, &mut sink);
                if !active {
                    break;
                }
                if sink.hits.len() > before {
                    // Not done with this one yet; it stays at the front
                    sink.spawns.push_front(spawn);
                    return true;
                }
            }
            if sink.hits.len() > before {
                return true;
            }
        }

        false
    }

    /// Master transition: register spawns, then follow `edge`
    fn step_master(
        &self,
        node: NodeIndex,
        edge: Symbol,
        pos: usize,
        budgets: MatchConfig,
        sink: &mut Sink<'_>,
    ) -> NodeIndex {
        if budgets.max_mismatches > 0 || (budgets.max_ambiguous > 0 && edge.is_ambiguous()) {
            let origin = SpawnOrigin {
                node,
                depth: self.depth(node),
                prefix_loss_left: None,
                ambiguous_left: budgets.max_ambiguous,
                mismatches_left: budgets.max_mismatches,
            };
            self.create_spawns(&origin, edge, pos, sink);
        }
        follow(&self.nodes, node, edge)
    }

    /// Advance a spawn by one symbol
    ///
    /// Returns `false` when the spawn retires: its first substitution has
    /// fallen out of the matched window.
    fn follow_spawn(&self, spawn: &mut Spawn, edge: Symbol, sink: &mut Sink<'_>) -> bool {
        let pos = spawn.cursor;
        let depth = self.depth(spawn.node);

        if spawn.mismatches_left > 0 || (spawn.ambiguous_left > 0 && edge.is_ambiguous()) {
            let origin = SpawnOrigin {
                node: spawn.node,
                depth,
                prefix_loss_left: Some(spawn.prefix_loss_left),
                ambiguous_left: spawn.ambiguous_left,
                mismatches_left: spawn.mismatches_left,
            };
            self.create_spawns(&origin, edge, pos, sink);
        }

        let next = follow(&self.nodes, spawn.node, edge);
        let loss = depth + 1 - self.depth(next);
        spawn.cursor += 1;
        if loss >= spawn.prefix_loss_left {
            return false;
        }

        spawn.prefix_loss_left -= loss;
        spawn.node = next;
        self.collect_hits(next, Some(spawn.prefix_loss_left), pos, sink);
        true
    }

    /// Branch off alternatives to `edge` at query position `pos`
    ///
    /// Ambiguous symbols expand to their concrete range (costing ambiguous
    /// budget). With mismatch budget left, every other concrete residue is
    /// tried as well, except those already covered by the expansion.
    fn create_spawns(&self, origin: &SpawnOrigin, edge: Symbol, pos: usize, sink: &mut Sink<'_>) {
        let mut covered: Option<SymbolRange> = None;

        if origin.ambiguous_left > 0 && edge.is_ambiguous() {
            let range = edge.expansion();
            for alt in range.clone() {
                self.spawn(
                    origin,
                    alt,
                    pos,
                    origin.ambiguous_left - 1,
                    origin.mismatches_left,
                    sink,
                );
            }
            covered = Some(range);
        }

        if origin.mismatches_left > 0 {
            for alt in Symbol::concrete() {
                if alt == edge || covered.as_ref().is_some_and(|r| r.contains(alt)) {
                    continue;
                }
                self.spawn(
                    origin,
                    alt,
                    pos,
                    origin.ambiguous_left,
                    origin.mismatches_left - 1,
                    sink,
                );
            }
        }
    }

    fn spawn(
        &self,
        origin: &SpawnOrigin,
        alt: Symbol,
        pos: usize,
        ambiguous_left: u8,
        mismatches_left: u8,
        sink: &mut Sink<'_>,
    ) {
        let node = follow(&self.nodes, origin.node, alt);
        let depth = self.depth(node);

        // The new window must still contain the substituted symbol (master)
        // or the parent's first substitution (spawn)
        let prefix_loss_left = match origin.prefix_loss_left {
            None => depth,
            Some(budget) => {
                let loss = origin.depth + 1 - depth;
                if loss >= budget {
                    return;
                }
                budget - loss
            }
        };
        if prefix_loss_left == 0 {
            return;
        }

        let spawn = Spawn {
            cursor: pos + 1,
            node,
            ambiguous_left,
            mismatches_left,
            prefix_loss_left,
        };
        self.collect_hits(node, Some(prefix_loss_left), pos, sink);
        if spawn.cursor < sink.query_len {
            sink.spawns.push_back(spawn);
        }
    }

    /// Report needles ending at `node` or along its suffix chain
    ///
    /// `pos` is the index of the query symbol just consumed. For spawns, a
    /// chain node is only reported while the window it spans still covers
    /// the first substitution.
    fn collect_hits(
        &self,
        node: NodeIndex,
        prefix_loss_left: Option<u8>,
        pos: usize,
        sink: &mut Sink<'_>,
    ) {
        let top = self.depth(node);
        let mut current = node;

        while self.nodes[current.get()].has_hit() {
            let n = &self.nodes[current.get()];
            let depth = n.depth();
            if let Some(budget) = prefix_loss_left {
                if top - depth >= budget {
                    break;
                }
            }

            if let Some(ordinals) = self.needles.get(&current) {
                let start = sink.offsets[pos + 1 - depth as usize];
                for &needle_index in ordinals {
                    sink.hits.push(Hit::new(needle_index, depth as u32, start));
                }
            }

            if current.is_root() {
                break;
            }
            current = n.suffix;
        }
    }

    #[inline]
    fn depth(&self, node: NodeIndex) -> u8 {
        self.nodes[node.get()].depth()
    }
}

/// Direct child of `node` along `symbol` in a compacted node array
#[inline]
pub(super) fn find_child(nodes: &[TrieNode], node: NodeIndex, symbol: Symbol) -> Option<NodeIndex> {
    let n = &nodes[node.get()];
    if n.nr_children == 0 {
        return None;
    }
    let first = n.first_child.get();
    nodes[first..first + n.nr_children as usize]
        .iter()
        .position(|child| child.edge == symbol)
        .map(|offset| NodeIndex::new(first + offset))
}

/// Aho-Corasick transition over a compacted node array
///
/// Requires suffix links to be final for `node` and its whole suffix chain.
pub(super) fn follow(nodes: &[TrieNode], mut node: NodeIndex, symbol: Symbol) -> NodeIndex {
    loop {
        if let Some(child) = find_child(nodes, node, symbol) {
            return child;
        }
        if node.is_root() {
            return NodeIndex::ROOT;
        }
        node = nodes[node.get()].suffix;
    }
}
