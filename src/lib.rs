//! # pepac - Peptide Aho-Corasick
//!
//! pepac finds many short peptide sequences (needles) in long protein
//! sequences (haystacks) in a single pass per haystack, tolerating ambiguous
//! residues and a bounded number of mismatches.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`alphabet`] - The 20 standard residues, the ambiguity classes `B`, `J`,
//!   `Z`, `X` and the `$` wildcard
//! - [`trie`] - Trie construction, compaction and the matching engine
//! - [`indexer`] - Batch search of many needles against many haystacks
//! - [`output`] - Result formatting for the command line
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```
//! use pepac::trie::{MatchConfig, SearchState, TrieBuilder};
//!
//! // Build once
//! let automaton = TrieBuilder::with_config(MatchConfig::new(0, 1))
//!     .add_needles_and_compress(["PEPTIDE", "KLM"])
//!     .unwrap();
//!
//! // Search any number of haystacks, one state per thread
//! let mut state = SearchState::new();
//! state.set_query("MKLMPEPTADE");
//! while automaton.next_hits(&mut state) {
//!     for hit in state.hits() {
//!         println!("needle {} at {}", hit.needle_index, hit.query_start);
//!     }
//! }
//! ```
//!
//! ## Approximate matching
//!
//! With a nonzero ambiguous budget, a `B`, `J`, `Z`, `X` or `$` in the
//! haystack may stand in for any residue it denotes. With a nonzero mismatch
//! budget, any haystack position may differ from the needle by one standard
//! residue. No occurrence is reported twice. A mismatch never stands in for
//! `B`, `J`, `Z` or `X` in a needle: those positions match only the same
//! letter, or a `$` in the haystack through the ambiguous budget.

pub mod alphabet;
pub mod error;
pub mod indexer;
pub mod output;
pub mod trie;

pub use alphabet::Symbol;
pub use error::{Error, Result};
pub use indexer::{
    DecoyConfig, DecoyPosition, IndexResult, IndexerConfig, MissingDecoyAction, NeedleAnnotation,
    NeedleMatch, PeptideIndexer, ProteinReferences, TargetDecoy,
};
pub use trie::{Automaton, Hit, MatchConfig, SearchState, TrieBuilder};
