//! Amino-acid alphabet used by the automaton.
//!
//! Every symbol is a one-byte code. The 20 standard residues come first,
//! followed by the ambiguity classes `B`, `J`, `Z`, `X` and the wildcard `$`.
//! Because ambiguous codes sort after all concrete ones, "is ambiguous" is a
//! single comparison.
//!
//! Nothing in this module fails: unknown characters map to
//! [`Symbol::INVALID`] and callers decide whether that is an error.

use std::fmt;

/// Letters in code order. Index in this table == symbol code.
const SYMBOL_CHARS: &[u8; 25] = b"ARNDCQEGHILKMFPSTWYVBJZX$";

/// Number of standard (concrete) residues
pub const CONCRETE_COUNT: u8 = 20;

const CODE_B: u8 = 20;
const CODE_J: u8 = 21;
const CODE_Z: u8 = 22;
const CODE_X: u8 = 23;
const CODE_ANY: u8 = 24;
const CODE_INVALID: u8 = 25;

/// ASCII -> code lookup, case-insensitive
const CHAR_TO_CODE: [u8; 128] = build_char_table();

/// Inclusive code ranges an ambiguous symbol expands to, indexed by `code - CODE_B`.
/// B -> N..D, J -> I..L, Z -> Q..E, X -> all 20, $ -> all 20 plus B, J, Z, X.
const EXPANSION: [(u8, u8); 5] = [(2, 3), (9, 10), (5, 6), (0, 19), (0, 23)];

const fn build_char_table() -> [u8; 128] {
    let mut table = [CODE_INVALID; 128];
    let mut i = 0;
    while i < SYMBOL_CHARS.len() {
        let c = SYMBOL_CHARS[i];
        table[c as usize] = i as u8;
        table[c.to_ascii_lowercase() as usize] = i as u8;
        i += 1;
    }
    table
}

/// A single amino-acid code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(u8);

impl Symbol {
    /// The "any amino acid or ambiguity class" wildcard (`$`)
    pub const ANY: Symbol = Symbol(CODE_ANY);
    /// Sentinel for characters outside the alphabet
    pub const INVALID: Symbol = Symbol(CODE_INVALID);
    pub const B: Symbol = Symbol(CODE_B);
    pub const J: Symbol = Symbol(CODE_J);
    pub const Z: Symbol = Symbol(CODE_Z);
    pub const X: Symbol = Symbol(CODE_X);

    /// Map an ASCII byte to its symbol (case-insensitive)
    #[inline]
    pub const fn from_byte(b: u8) -> Self {
        if b < 128 {
            Symbol(CHAR_TO_CODE[b as usize])
        } else {
            Self::INVALID
        }
    }

    /// Raw code, usable as a dense array index
    #[inline]
    pub const fn code(self) -> u8 {
        self.0
    }

    /// One of the 20 standard residues
    #[inline]
    pub const fn is_concrete(self) -> bool {
        self.0 < CONCRETE_COUNT
    }

    /// B, J, Z, X or the `$` wildcard
    #[inline]
    pub const fn is_ambiguous(self) -> bool {
        self.0 >= CODE_B && self.0 <= CODE_ANY
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 != CODE_INVALID
    }

    /// Whether the symbol may appear in a needle. The wildcard is query-only.
    #[inline]
    pub const fn is_valid_for_peptide(self) -> bool {
        self.0 < CODE_ANY
    }

    /// Upper-case letter for this symbol (`?` for the invalid sentinel)
    pub fn to_char(self) -> char {
        SYMBOL_CHARS
            .get(self.0 as usize)
            .map(|&b| b as char)
            .unwrap_or('?')
    }

    /// Concrete interpretations of an ambiguous symbol.
    ///
    /// Returns an empty iterator for concrete and invalid symbols.
    pub fn expansion(self) -> SymbolRange {
        if self.is_ambiguous() {
            let (from, to) = EXPANSION[(self.0 - CODE_B) as usize];
            SymbolRange::new(from, to)
        } else {
            SymbolRange::empty()
        }
    }

    /// All 20 standard residues in code order
    pub fn concrete() -> SymbolRange {
        SymbolRange::new(0, CONCRETE_COUNT - 1)
    }
}

impl From<u8> for Symbol {
    fn from(b: u8) -> Self {
        Symbol::from_byte(b)
    }
}

impl From<char> for Symbol {
    fn from(c: char) -> Self {
        if c.is_ascii() {
            Symbol::from_byte(c as u8)
        } else {
            Symbol::INVALID
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.to_char())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Inclusive, contiguous run of symbol codes.
#[derive(Debug, Clone)]
pub struct SymbolRange {
    next: u8,
    end: u8, // exclusive
}

impl SymbolRange {
    fn new(from: u8, to: u8) -> Self {
        Self {
            next: from,
            end: to + 1,
        }
    }

    fn empty() -> Self {
        Self { next: 0, end: 0 }
    }

    /// Check membership without consuming the range
    #[inline]
    pub fn contains(&self, symbol: Symbol) -> bool {
        symbol.0 >= self.next && symbol.0 < self.end
    }
}

impl Iterator for SymbolRange {
    type Item = Symbol;

    #[inline]
    fn next(&mut self) -> Option<Symbol> {
        if self.next < self.end {
            let s = Symbol(self.next);
            self.next += 1;
            Some(s)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.end.saturating_sub(self.next) as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for SymbolRange {}
