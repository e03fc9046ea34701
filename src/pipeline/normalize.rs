//! Text normalization for extracted page text.
//!
//! OCR output is messy at the byte level: decomposed accents (`e` followed
//! by a combining acute instead of `é`), stray control characters, and
//! invisible Unicode (zero-width spaces, soft hyphens) that break both the
//! "does this page have text?" probe and any downstream grep. Two cheap
//! passes fix all of it without touching content:
//!
//! 1. Unicode canonical composition (NFC), so accented Portuguese
//!    characters compare equal regardless of how the extractor emitted them;
//! 2. a printable-character filter that drops control characters,
//!    non-space whitespace, and known invisible code points.
//!
//! Both passes are pure and idempotent: `normalize(normalize(x)) ==
//! normalize(x)`.

use unicode_normalization::UnicodeNormalization;

/// Invisible code points the filter drops even though they are neither
/// control characters nor whitespace: zero-width space/joiners, BOM, word
/// joiner, soft hyphen.
const INVISIBLE: [char; 6] = [
    '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}', '\u{2060}', '\u{00AD}',
];

/// Canonicalize extracted text: NFC-compose, then keep only printable
/// characters (space survives; tabs, newlines, NBSP, and invisible code
/// points do not).
pub fn normalize(text: &str) -> String {
    text.nfc().filter(|&c| is_printable(c)).collect()
}

/// Like [`normalize`] but mapping a missing value to the empty string,
/// mirroring extractors that return `None` for pages without text.
pub fn normalize_opt(text: Option<&str>) -> String {
    text.map(normalize).unwrap_or_default()
}

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    !c.is_control() && !c.is_whitespace() && !INVISIBLE.contains(&c)
}
