//! Error types for automaton construction and batch indexing.
//!
//! Searching never fails: characters outside the alphabet are skipped.
//! Errors only arise while registering needles or when the indexer is
//! asked to run on unusable input.

use crate::indexer::DecoyPosition;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A needle contains a character outside the peptide alphabet
    #[error("needle {needle_index}: invalid symbol {character:?} at position {position}")]
    InvalidSymbol {
        needle_index: u32,
        position: usize,
        character: char,
    },

    /// Zero-length needles cannot be registered
    #[error("needle {needle_index} is empty")]
    EmptyNeedle { needle_index: u32 },

    /// Node depth is stored in 7 bits
    #[error("needle {needle_index} has length {length}, maximum is {max}")]
    NeedleTooLong {
        needle_index: u32,
        length: usize,
        max: usize,
    },

    /// Raised by the indexer when `allow_unmatched` is off
    #[error("{count} of {total} needles could not be matched to any haystack")]
    UnmatchedNeedles { count: usize, total: usize },

    /// The indexer was given no haystacks to search
    #[error("no haystacks provided; mapping against an empty database makes no sense")]
    EmptyDatabase,

    #[error("{accessions} accessions given for {haystacks} haystacks")]
    AccessionCount { accessions: usize, haystacks: usize },

    /// No needle mapped to a haystack whose accession carries the decoy tag
    #[error(
        "no needle matched a decoy haystack; is the decoy string {decoy_string:?} ({position}) right?"
    )]
    MissingDecoy {
        decoy_string: String,
        position: DecoyPosition,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
