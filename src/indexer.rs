//! Batch peptide indexing
//!
//! Maps a list of peptides (needles) onto a protein database (haystacks):
//! one automaton is built from all needles and every haystack is searched in
//! parallel, one [`SearchState`] per worker thread.
//!
//! When haystacks carry accessions, every matched needle is also labelled
//! target, decoy or both, depending on whether the accessions it maps to
//! carry the configured decoy tag.

use crate::error::{Error, Result};
use crate::trie::{Automaton, AutomatonStats, MatchConfig, SearchState, TrieBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Indexer settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Error budgets for the automaton
    pub matching: MatchConfig,
    /// Treat the isobaric residues I and L as indistinguishable
    pub il_equivalent: bool,
    /// Read selenocysteine (U) as X instead of rejecting or skipping it
    pub substitute_u: bool,
    /// Succeed even when some needles occur in no haystack
    pub allow_unmatched: bool,
    /// How decoy haystacks are recognized by accession
    pub decoy: DecoyConfig,
}

/// Where the decoy tag sits in an accession
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyPosition {
    #[default]
    Prefix,
    Suffix,
}

impl fmt::Display for DecoyPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoyPosition::Prefix => f.write_str("prefix"),
            DecoyPosition::Suffix => f.write_str("suffix"),
        }
    }
}

/// What to do when no needle maps to a decoy haystack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingDecoyAction {
    #[default]
    Error,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoyConfig {
    /// Tag marking decoy accessions
    pub decoy_string: String,
    pub position: DecoyPosition,
    pub missing_action: MissingDecoyAction,
}

impl Default for DecoyConfig {
    fn default() -> Self {
        Self {
            decoy_string: "DECOY_".to_string(),
            position: DecoyPosition::Prefix,
            missing_action: MissingDecoyAction::Error,
        }
    }
}

impl DecoyConfig {
    pub fn is_decoy(&self, accession: &str) -> bool {
        match self.position {
            DecoyPosition::Prefix => accession.starts_with(&self.decoy_string),
            DecoyPosition::Suffix => accession.ends_with(&self.decoy_string),
        }
    }
}

/// How many distinct haystacks (or accessions) a needle maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProteinReferences {
    Unmatched,
    Unique,
    NonUnique,
}

/// Whether a needle maps to target haystacks, decoy haystacks or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetDecoy {
    Target,
    Decoy,
    TargetDecoy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeedleAnnotation {
    pub references: ProteinReferences,
    /// `None` without accessions, or when the needle is unmatched
    pub target_decoy: Option<TargetDecoy>,
}

/// One occurrence of a needle in a haystack
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeedleMatch {
    pub needle_index: u32,
    pub haystack_index: u32,
    /// Byte offset in the haystack of the first matched residue
    pub position: usize,
    /// Needle length in residues
    pub length: u32,
}

/// Everything the indexer found
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexResult {
    pub config: IndexerConfig,
    pub needle_count: usize,
    pub haystack_count: usize,
    /// Shape of the automaton built from the needles
    pub stats: AutomatonStats,
    /// Sorted by needle, then haystack, then position
    pub matches: Vec<NeedleMatch>,
    /// Sorted, distinct haystack indices per needle
    pub needle_haystacks: Vec<Vec<u32>>,
    /// Needles that occur in no haystack
    pub unmatched: Vec<u32>,
    /// One per haystack, empty when the haystacks were given without
    pub accessions: Vec<String>,
    /// One per needle
    pub annotations: Vec<NeedleAnnotation>,
}

impl IndexResult {
    /// Number of needles with at least one match
    pub fn matched_needle_count(&self) -> usize {
        self.needle_count - self.unmatched.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Number of needles carrying the given target/decoy label
    pub fn target_decoy_count(&self, label: TargetDecoy) -> usize {
        self.annotations
            .iter()
            .filter(|a| a.target_decoy == Some(label))
            .count()
    }

    /// Accession of a haystack, or its index when none was given
    pub fn haystack_label(&self, haystack_index: u32) -> String {
        self.accessions
            .get(haystack_index as usize)
            .cloned()
            .unwrap_or_else(|| haystack_index.to_string())
    }
}

/// Maps needles onto haystacks
pub struct PeptideIndexer {
    config: IndexerConfig,
}

impl PeptideIndexer {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    /// Find every needle in every haystack
    ///
    /// Needle and haystack indices in the result refer to positions in the
    /// input slices. Fails if a needle is invalid, if there are no haystacks,
    /// or if a needle is unmatched and `allow_unmatched` is off.
    pub fn index<N, H>(&self, needles: &[N], haystacks: &[H]) -> Result<IndexResult>
    where
        N: AsRef<[u8]>,
        H: AsRef<[u8]> + Sync,
    {
        self.run(needles, haystacks, Vec::new())
    }

    /// Like [`Self::index`], with one accession per haystack
    ///
    /// Needles are additionally labelled target, decoy or both. Fails with
    /// [`Error::MissingDecoy`] if no needle maps to a decoy haystack and the
    /// configured action is [`MissingDecoyAction::Error`].
    pub fn index_with_accessions<N, A, H>(
        &self,
        needles: &[N],
        accessions: &[A],
        haystacks: &[H],
    ) -> Result<IndexResult>
    where
        N: AsRef<[u8]>,
        A: AsRef<str>,
        H: AsRef<[u8]> + Sync,
    {
        if accessions.len() != haystacks.len() {
            return Err(Error::AccessionCount {
                accessions: accessions.len(),
                haystacks: haystacks.len(),
            });
        }
        let accessions = accessions.iter().map(|a| a.as_ref().to_string()).collect();
        self.run(needles, haystacks, accessions)
    }

    fn run<N, H>(
        &self,
        needles: &[N],
        haystacks: &[H],
        accessions: Vec<String>,
    ) -> Result<IndexResult>
    where
        N: AsRef<[u8]>,
        H: AsRef<[u8]> + Sync,
    {
        if needles.is_empty() {
            log::warn!("no needles given, nothing to index");
            return Ok(IndexResult {
                config: self.config.clone(),
                haystack_count: haystacks.len(),
                accessions,
                ..Default::default()
            });
        }
        if haystacks.is_empty() {
            return Err(Error::EmptyDatabase);
        }

        if !self.config.il_equivalent {
            self.warn_ambiguous_il(haystacks, &accessions);
        }

        let substituted = AtomicUsize::new(0);
        let automaton = self.build_automaton(needles, &substituted)?;

        let per_haystack = self.search_all(&automaton, haystacks, &substituted);

        let substituted = substituted.load(Ordering::Relaxed);
        if substituted > 0 {
            log::warn!(
                "replaced {} occurrence(s) of selenocysteine 'U' with 'X'",
                substituted
            );
        }

        let mut matches: Vec<NeedleMatch> = per_haystack.into_iter().flatten().collect();
        matches.sort_unstable();

        let mut needle_haystacks: Vec<Vec<u32>> = vec![Vec::new(); needles.len()];
        for m in &matches {
            let set = &mut needle_haystacks[m.needle_index as usize];
            if set.last() != Some(&m.haystack_index) {
                set.push(m.haystack_index);
            }
        }
        let unmatched: Vec<u32> = needle_haystacks
            .iter()
            .enumerate()
            .filter(|(_, set)| set.is_empty())
            .map(|(i, _)| i as u32)
            .collect();

        log::info!(
            "found {} hits for {} of {} needles",
            matches.len(),
            needles.len() - unmatched.len(),
            needles.len()
        );

        let annotations = self.annotate(&needle_haystacks, &accessions);
        if !accessions.is_empty() {
            self.check_decoys(&annotations)?;
        }

        if !unmatched.is_empty() {
            if !self.config.allow_unmatched {
                return Err(Error::UnmatchedNeedles {
                    count: unmatched.len(),
                    total: needles.len(),
                });
            }
            log::warn!(
                "{} of {} needles could not be matched to any haystack",
                unmatched.len(),
                needles.len()
            );
        }

        Ok(IndexResult {
            config: self.config.clone(),
            needle_count: needles.len(),
            haystack_count: haystacks.len(),
            stats: automaton.stats(),
            matches,
            needle_haystacks,
            unmatched,
            accessions,
            annotations,
        })
    }

    /// A haystack J only matches I or L through the ambiguous budget
    fn warn_ambiguous_il<H: AsRef<[u8]>>(&self, haystacks: &[H], accessions: &[String]) {
        let Some((first, count)) = haystacks_with_j(haystacks) else {
            return;
        };
        let label = accessions
            .get(first)
            .cloned()
            .unwrap_or_else(|| first.to_string());
        log::warn!(
            "{} haystack(s) contain 'J', first '{}'; without I/L equivalence J matches I or L \
             only within the ambiguous budget, so matches may be missed",
            count,
            label
        );
    }

    /// Reference and target/decoy labels per needle
    ///
    /// References count distinct accessions when given, so a sequence listed
    /// twice under one accession still counts as unique.
    fn annotate(
        &self,
        needle_haystacks: &[Vec<u32>],
        accessions: &[String],
    ) -> Vec<NeedleAnnotation> {
        let decoy = &self.config.decoy;
        needle_haystacks
            .iter()
            .map(|set| {
                let distinct = if accessions.is_empty() {
                    set.len()
                } else {
                    set.iter()
                        .map(|&h| accessions[h as usize].as_str())
                        .collect::<BTreeSet<_>>()
                        .len()
                };
                let references = match distinct {
                    0 => ProteinReferences::Unmatched,
                    1 => ProteinReferences::Unique,
                    _ => ProteinReferences::NonUnique,
                };

                let target_decoy = if accessions.is_empty() {
                    None
                } else {
                    let (mut target, mut decoy_hit) = (false, false);
                    for &h in set {
                        if decoy.is_decoy(&accessions[h as usize]) {
                            decoy_hit = true;
                        } else {
                            target = true;
                        }
                    }
                    match (target, decoy_hit) {
                        (true, true) => Some(TargetDecoy::TargetDecoy),
                        (true, false) => Some(TargetDecoy::Target),
                        (false, true) => Some(TargetDecoy::Decoy),
                        (false, false) => None,
                    }
                };

                NeedleAnnotation {
                    references,
                    target_decoy,
                }
            })
            .collect()
    }

    fn check_decoys(&self, annotations: &[NeedleAnnotation]) -> Result<()> {
        let count = |label| {
            annotations
                .iter()
                .filter(|a| a.target_decoy == Some(label))
                .count()
        };
        let (target, decoy, both) = (
            count(TargetDecoy::Target),
            count(TargetDecoy::Decoy),
            count(TargetDecoy::TargetDecoy),
        );
        log::info!("target only: {target}, decoy only: {decoy}, both: {both}");

        if decoy + both > 0 {
            return Ok(());
        }
        let config = &self.config.decoy;
        match config.missing_action {
            MissingDecoyAction::Error => Err(Error::MissingDecoy {
                decoy_string: config.decoy_string.clone(),
                position: config.position,
            }),
            MissingDecoyAction::Warn => {
                log::warn!(
                    "no needle matched a decoy haystack; check the decoy string '{}' ({})",
                    config.decoy_string,
                    config.position
                );
                Ok(())
            }
        }
    }

    fn build_automaton<N: AsRef<[u8]>>(
        &self,
        needles: &[N],
        substituted: &AtomicUsize,
    ) -> Result<Automaton> {
        let normalized: Vec<Vec<u8>> = needles
            .iter()
            .map(|needle| self.normalize_needle(needle.as_ref(), substituted))
            .collect();
        TrieBuilder::with_config(self.config.matching).add_needles_and_compress(&normalized)
    }

    #[cfg(feature = "parallel")]
    fn search_all<H>(
        &self,
        automaton: &Automaton,
        haystacks: &[H],
        substituted: &AtomicUsize,
    ) -> Vec<Vec<NeedleMatch>>
    where
        H: AsRef<[u8]> + Sync,
    {
        haystacks
            .par_iter()
            .enumerate()
            .map_init(SearchState::new, |state, (i, haystack)| {
                self.search_one(automaton, state, i, haystack.as_ref(), substituted)
            })
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn search_all<H>(
        &self,
        automaton: &Automaton,
        haystacks: &[H],
        substituted: &AtomicUsize,
    ) -> Vec<Vec<NeedleMatch>>
    where
        H: AsRef<[u8]> + Sync,
    {
        log::warn!(
            "built without the `parallel` feature; searching {} haystacks sequentially",
            haystacks.len()
        );
        let mut state = SearchState::new();
        haystacks
            .iter()
            .enumerate()
            .map(|(i, haystack)| {
                self.search_one(automaton, &mut state, i, haystack.as_ref(), substituted)
            })
            .collect()
    }

    fn search_one(
        &self,
        automaton: &Automaton,
        state: &mut SearchState,
        haystack_index: usize,
        haystack: &[u8],
        substituted: &AtomicUsize,
    ) -> Vec<NeedleMatch> {
        state.set_query(self.normalize_haystack(haystack, substituted));
        automaton.get_all_hits(state);
        state
            .hits()
            .iter()
            .map(|hit| NeedleMatch {
                needle_index: hit.needle_index,
                haystack_index: haystack_index as u32,
                position: hit.query_start,
                length: hit.needle_length,
            })
            .collect()
    }

    /// Apply residue mappings and drop stop codons (`*`)
    pub fn normalize_needle(&self, needle: &[u8], substituted: &AtomicUsize) -> Vec<u8> {
        needle
            .iter()
            .filter(|&&b| b != b'*')
            .map(|&b| self.map_residue(b, substituted))
            .collect()
    }

    /// Apply residue mappings
    ///
    /// Keeps every byte in place so match positions stay valid for the
    /// caller's haystack. Stop codons are skipped during search anyway.
    pub fn normalize_haystack(&self, haystack: &[u8], substituted: &AtomicUsize) -> Vec<u8> {
        haystack
            .iter()
            .map(|&b| self.map_residue(b, substituted))
            .collect()
    }

    #[inline]
    fn map_residue(&self, b: u8, substituted: &AtomicUsize) -> u8 {
        match b.to_ascii_uppercase() {
            b'L' | b'J' if self.config.il_equivalent => b'I',
            b'U' if self.config.substitute_u => {
                substituted.fetch_add(1, Ordering::Relaxed);
                b'X'
            }
            _ => b,
        }
    }
}

/// Index of the first haystack containing `J`, and how many do
fn haystacks_with_j<H: AsRef<[u8]>>(haystacks: &[H]) -> Option<(usize, usize)> {
    let mut with_j = haystacks
        .iter()
        .enumerate()
        .filter(|(_, h)| h.as_ref().iter().any(|b| b.eq_ignore_ascii_case(&b'J')))
        .map(|(i, _)| i);
    let first = with_j.next()?;
    Some((first, with_j.count() + 1))
}

impl Default for PeptideIndexer {
    fn default() -> Self {
        Self::new(IndexerConfig::default())
    }
}
