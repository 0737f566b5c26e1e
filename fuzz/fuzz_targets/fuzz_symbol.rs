#![no_main]

use libfuzzer_sys::fuzz_target;
use pepac::Symbol;

fuzz_target!(|data: &[u8]| {
    for &b in data {
        let symbol = Symbol::from(b);
        if !symbol.is_valid() {
            assert!(!symbol.is_concrete() && !symbol.is_ambiguous());
            continue;
        }

        // Round trip through the canonical letter
        assert_eq!(Symbol::from(symbol.to_char()), symbol);
        assert_eq!(symbol.is_concrete(), !symbol.is_ambiguous());

        let expansion = symbol.expansion();
        if symbol.is_ambiguous() {
            assert!(expansion.len() >= 2);
            for alt in expansion {
                assert!(alt.is_valid_for_peptide());
                assert_ne!(alt, symbol);
            }
        } else {
            assert_eq!(expansion.len(), 0);
        }
    }
});
