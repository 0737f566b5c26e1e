//! Integration tests for the matching engine.
//!
//! The automaton is checked against a brute-force reference that tries every
//! needle at every haystack position and counts ambiguous resolutions and
//! mismatches directly.

use pepac::trie::{Automaton, Hit, MatchConfig, SearchState, TrieBuilder};
use pepac::Symbol;
use proptest::prelude::*;

fn build(needles: &[Vec<u8>], config: MatchConfig) -> Automaton {
    TrieBuilder::with_config(config)
        .add_needles_and_compress(needles)
        .unwrap()
}

fn build_str(needles: &[&str], config: MatchConfig) -> Automaton {
    TrieBuilder::with_config(config)
        .add_needles_and_compress(needles.iter().copied())
        .unwrap()
}

fn sorted(mut hits: Vec<Hit>) -> Vec<Hit> {
    hits.sort();
    hits
}

/// Every (needle, start) whose window is within budget
///
/// Ambiguous budget is spent first; ambiguous positions beyond it fall back
/// to the mismatch budget.
fn brute_force(needles: &[Vec<u8>], haystack: &[u8], config: MatchConfig) -> Vec<Hit> {
    let (query, offsets): (Vec<Symbol>, Vec<usize>) = haystack
        .iter()
        .enumerate()
        .map(|(i, &b)| (Symbol::from(b), i))
        .filter(|(s, _)| s.is_valid())
        .unzip();

    let mut hits = Vec::new();
    for (needle_index, needle) in needles.iter().enumerate() {
        let needle: Vec<Symbol> = needle.iter().map(|&b| Symbol::from(b)).collect();
        if needle.len() > query.len() {
            continue;
        }
        for start in 0..=query.len() - needle.len() {
            let mut ambiguous = 0u32;
            let mut mismatches = 0u32;
            for (q, n) in query[start..].iter().zip(&needle) {
                if q == n {
                    continue;
                }
                if q.is_ambiguous() && q.expansion().contains(*n) {
                    ambiguous += 1;
                } else {
                    mismatches += 1;
                }
            }
            let overflow = ambiguous.saturating_sub(config.max_ambiguous as u32);
            if mismatches + overflow <= config.max_mismatches as u32 {
                hits.push(Hit::new(
                    needle_index as u32,
                    needle.len() as u32,
                    offsets[start],
                ));
            }
        }
    }
    sorted(hits)
}

/// Like [`brute_force`], but needles may hold the classes B, J, Z and X
///
/// Walks each window left to right. A query class that covers the needle
/// residue uses the ambiguous budget while any is left; otherwise the
/// position needs a mismatch, which only a standard needle residue can take.
/// A class in the needle is therefore matched only by the same letter or by
/// a `$` with ambiguous budget to spare.
fn brute_force_with_classes(
    needles: &[Vec<u8>],
    haystack: &[u8],
    config: MatchConfig,
) -> Vec<Hit> {
    let (query, offsets): (Vec<Symbol>, Vec<usize>) = haystack
        .iter()
        .enumerate()
        .map(|(i, &b)| (Symbol::from(b), i))
        .filter(|(s, _)| s.is_valid())
        .unzip();

    let within_budget = |window: &[Symbol], needle: &[Symbol]| {
        let mut ambiguous_left = config.max_ambiguous;
        let mut mismatches_left = config.max_mismatches;
        for (q, n) in window.iter().zip(needle) {
            if q == n {
                continue;
            }
            if ambiguous_left > 0 && q.is_ambiguous() && q.expansion().contains(*n) {
                ambiguous_left -= 1;
            } else if mismatches_left > 0 && n.is_concrete() {
                mismatches_left -= 1;
            } else {
                return false;
            }
        }
        true
    };

    let mut hits = Vec::new();
    for (needle_index, needle) in needles.iter().enumerate() {
        let needle: Vec<Symbol> = needle.iter().map(|&b| Symbol::from(b)).collect();
        for start in 0..(query.len() + 1).saturating_sub(needle.len()) {
            if within_budget(&query[start..], &needle) {
                hits.push(Hit::new(
                    needle_index as u32,
                    needle.len() as u32,
                    offsets[start],
                ));
            }
        }
    }
    sorted(hits)
}

fn collect_incrementally(automaton: &Automaton, haystack: &[u8]) -> Vec<Hit> {
    let mut state = SearchState::with_query(haystack);
    let mut hits = Vec::new();
    while automaton.next_hits(&mut state) {
        assert!(!state.hits().is_empty());
        hits.extend_from_slice(state.hits());
    }
    sorted(hits)
}

fn needle_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    let needle = proptest::collection::vec(proptest::sample::select(b"ACDEIL".to_vec()), 1..=5);
    proptest::collection::vec(needle, 1..=6)
}

fn class_needle_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    let needle =
        proptest::collection::vec(proptest::sample::select(b"ACDNEQILBJZX".to_vec()), 1..=5);
    proptest::collection::vec(needle, 1..=6)
}

fn class_haystack_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(proptest::sample::select(b"ACDNEQILBJZX$*W".to_vec()), 0..=32)
}

fn haystack_strategy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(proptest::sample::select(b"ACDEILBJZX$*".to_vec()), 0..=24)
}

proptest! {
    #[test]
    fn exact_matches_brute_force(needles in needle_strategy(), haystack in haystack_strategy()) {
        let config = MatchConfig::default();
        let automaton = build(&needles, config);
        let found = sorted(automaton.find_all(&haystack));
        prop_assert_eq!(found, brute_force(&needles, &haystack, config));
    }

    #[test]
    fn approximate_matches_brute_force(
        needles in needle_strategy(),
        haystack in haystack_strategy(),
        max_ambiguous in 0u8..=2,
        max_mismatches in 0u8..=2,
    ) {
        let config = MatchConfig::new(max_ambiguous, max_mismatches);
        let automaton = build(&needles, config);
        let found = sorted(automaton.find_all(&haystack));
        prop_assert_eq!(found, brute_force(&needles, &haystack, config));
    }

    #[test]
    fn class_needles_match_brute_force(
        needles in class_needle_strategy(),
        haystack in class_haystack_strategy(),
        max_ambiguous in 0u8..=3,
        max_mismatches in 0u8..=3,
    ) {
        let config = MatchConfig::new(max_ambiguous, max_mismatches);
        let automaton = build(&needles, config);
        let found = sorted(automaton.find_all(&haystack));
        prop_assert_eq!(&found, &brute_force_with_classes(&needles, &haystack, config));
        prop_assert_eq!(collect_incrementally(&automaton, &haystack), found);
    }

    #[test]
    fn next_hits_resumes_without_loss(
        needles in needle_strategy(),
        haystack in haystack_strategy(),
        max_ambiguous in 0u8..=2,
        max_mismatches in 0u8..=1,
    ) {
        let automaton = build(&needles, MatchConfig::new(max_ambiguous, max_mismatches));
        let all = sorted(automaton.find_all(&haystack));
        prop_assert_eq!(collect_incrementally(&automaton, &haystack), all);
    }

    #[test]
    fn larger_budgets_only_add_hits(
        needles in needle_strategy(),
        haystack in haystack_strategy(),
        max_ambiguous in 0u8..=1,
        max_mismatches in 0u8..=1,
    ) {
        let base = build(&needles, MatchConfig::new(max_ambiguous, max_mismatches)).find_all(&haystack);
        let more_ambiguous =
            build(&needles, MatchConfig::new(max_ambiguous + 1, max_mismatches)).find_all(&haystack);
        let more_mismatches =
            build(&needles, MatchConfig::new(max_ambiguous, max_mismatches + 1)).find_all(&haystack);

        for hit in &base {
            prop_assert!(more_ambiguous.contains(hit), "{:?} lost with more ambiguity", hit);
            prop_assert!(more_mismatches.contains(hit), "{:?} lost with more mismatches", hit);
        }
    }

    #[test]
    fn repeated_searches_agree(needles in needle_strategy(), haystack in haystack_strategy()) {
        let automaton = build(&needles, MatchConfig::new(1, 1));
        let mut state = SearchState::new();

        state.set_query(&haystack);
        automaton.get_all_hits(&mut state);
        let first = sorted(state.take_hits());

        state.set_query(&haystack);
        automaton.get_all_hits(&mut state);
        prop_assert_eq!(sorted(state.take_hits()), first);
    }
}

#[test]
fn ambiguous_query_symbol_found_once() {
    let automaton = build_str(&["AN"], MatchConfig::new(1, 0));
    assert_eq!(automaton.find_all("AB"), vec![Hit::new(0, 2, 0)]);
}

#[test]
fn ambiguous_needle_and_mismatch_budget() {
    let exact = build_str(&["AAA", "AAB"], MatchConfig::default());
    assert_eq!(exact.find_all("AAA"), vec![Hit::new(0, 3, 0)]);

    // A mismatch substitutes a standard residue, never the class B itself
    let tolerant = build_str(&["AAA", "AAB"], MatchConfig::new(0, 1));
    assert_eq!(tolerant.find_all("AAA"), vec![Hit::new(0, 3, 0)]);
}

#[test]
fn class_needle_through_wildcard() {
    // The first `$` takes the only ambiguous resolution, so B is out of reach
    let automaton = build_str(&["AB"], MatchConfig::new(1, 1));
    assert!(automaton.find_all("$$").is_empty());

    let automaton = build_str(&["BA"], MatchConfig::new(1, 1));
    assert_eq!(automaton.find_all("$$"), vec![Hit::new(0, 2, 0)]);
    assert!(automaton.find_all("XA").is_empty());
    assert_eq!(automaton.find_all("BW"), vec![Hit::new(0, 2, 0)]);
}

#[test]
fn flanked_by_unknown_residues() {
    let automaton = build_str(&["SYVAWDR"], MatchConfig::default());
    let mut state = SearchState::with_query("XSYVAWDRX");
    automaton.get_all_hits(&mut state);
    assert_eq!(state.hits(), &[Hit::new(0, 7, 1)]);
}

#[test]
fn empty_and_short_haystacks() {
    let automaton = build_str(&["PEPTIDE"], MatchConfig::new(2, 2));
    assert!(automaton.find_all("").is_empty());
    assert!(automaton.find_all("PEPTID").is_empty());
    assert!(automaton.find_all("**12").is_empty());

    let mut state = SearchState::with_query("");
    assert!(!automaton.next_hits(&mut state));
}

#[test]
fn shared_automaton_across_threads() {
    let automaton = build_str(&["PEP", "TIDE", "KLMN"], MatchConfig::new(1, 1));
    let haystacks = ["PEPTIDE", "KLMW", "BJZXPEPZIDE", "WWWWW"];
    let expected: Vec<Vec<Hit>> = haystacks
        .iter()
        .map(|h| sorted(automaton.find_all(h)))
        .collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = haystacks
            .iter()
            .map(|h| {
                let automaton = &automaton;
                scope.spawn(move || collect_incrementally(automaton, h.as_bytes()))
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(&expected) {
            assert_eq!(&handle.join().unwrap(), expected);
        }
    });
}

#[test]
fn long_needle_at_max_depth() {
    let needle = "ACDEFGHIKLMNPQRSTVWY".repeat(7);
    let needle = &needle[..pepac::trie::MAX_DEPTH];
    let automaton = build_str(&[needle], MatchConfig::new(0, 1));

    // One substitution inside the occurrence
    let mut haystack = format!("KK{needle}KK").into_bytes();
    assert_eq!(haystack[40], b'W');
    haystack[40] = b'A';
    assert_eq!(automaton.find_all(&haystack), vec![Hit::new(0, 127, 2)]);
}
