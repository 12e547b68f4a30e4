//! Fuzz testing for the input line parser.
//!
//! Any UTF-8 text must either parse into a line with strictly increasing
//! levels and finite coordinates, or be rejected with an error.

#![no_main]

use libfuzzer_sys::fuzz_target;

use geodict::address::parse_line;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(Some(line)) = parse_line(text, "fuzz.txt", 1) {
        assert!(!line.elements.is_empty());
        assert!(line.elements.windows(2).all(|w| w[0].level < w[1].level));
        assert!(line.x.is_finite() && line.y.is_finite());
    }
});
