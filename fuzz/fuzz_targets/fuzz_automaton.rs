#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pepac::trie::{MatchConfig, SearchState, TrieBuilder};

#[derive(Debug, Arbitrary)]
struct Input {
    needles: Vec<Vec<u8>>,
    haystack: Vec<u8>,
    max_ambiguous: u8,
    max_mismatches: u8,
}

fuzz_target!(|input: Input| {
    // Keep the spawn tree small enough for the fuzzer to make progress
    if input.needles.len() > 32 || input.haystack.len() > 512 {
        return;
    }
    let config = MatchConfig::new(input.max_ambiguous % 4, input.max_mismatches % 3);

    // Invalid needles must be rejected, never panic
    let Ok(automaton) = TrieBuilder::with_config(config).add_needles_and_compress(&input.needles)
    else {
        return;
    };

    let mut state = SearchState::with_query(&input.haystack);
    let mut incremental = Vec::new();
    while automaton.next_hits(&mut state) {
        assert!(!state.hits().is_empty());
        incremental.extend_from_slice(state.hits());
    }

    let mut all = automaton.find_all(&input.haystack);
    all.sort();
    incremental.sort();
    assert_eq!(incremental, all);

    for hit in &all {
        let needle = &input.needles[hit.needle_index as usize];
        assert_eq!(hit.needle_length as usize, needle.len());
        assert!(hit.query_start < input.haystack.len());
    }
    // Each occurrence is reported by exactly one search path
    assert!(all.windows(2).all(|w| w[0] != w[1]));
});
