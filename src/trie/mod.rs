//! Multi-pattern automaton over the peptide alphabet
//!
//! ## Architecture
//!
//! - `builder`: Sparse, growable trie for needle registration
//! - `compact`: Freezes the trie into BFS order and computes suffix links
//! - `automaton`: The immutable automaton and the matching engine
//! - `state`: Per-query traversal state (master path, spawn queue, hits)
//! - `types`: Node layout, hits and error budgets
//!
//! ## Example
//!
//! ```
//! use pepac::trie::{Hit, MatchConfig, SearchState, TrieBuilder};
//!
//! let automaton = TrieBuilder::with_config(MatchConfig::new(1, 0))
//!     .add_needles_and_compress(["PEPTIDE", "TIDE"])
//!     .unwrap();
//!
//! let mut state = SearchState::with_query("KPEPTJDE");
//! automaton.get_all_hits(&mut state);
//!
//! let mut hits = state.take_hits();
//! hits.sort();
//! assert_eq!(hits, vec![Hit::new(0, 7, 1), Hit::new(1, 4, 4)]);
//! ```

pub mod automaton;
pub mod builder;
mod compact;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use automaton::Automaton;
pub use builder::TrieBuilder;
pub use state::{SearchState, Spawn};
pub use types::{AutomatonStats, Hit, MatchConfig, NodeIndex, TrieNode, MAX_DEPTH};
