//! Arabic orthography helpers.
//!
//! Children's readers are printed fully vowelled while speech-to-text output
//! is almost always bare consonantal text, and the same word is routinely
//! written with different Hamza seats.  These helpers let the normalizer:
//!
//! 1. Strip **tashkeel** (every combining mark) and **tatweel** (U+0640).
//! 2. Fold **Hamza seats** and a few other orthographic variants onto one
//!    canonical letter.
//! 3. Detect whether a word carries any diacritics at all.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

// ---------------------------------------------------------------------------
// Code points
// ---------------------------------------------------------------------------

/// Arabic tatweel (kashida), a purely typographic elongation.
pub const TATWEEL: char = '\u{0640}';

/// Isolated Hamza (ء).  Dropped entirely during folding.
const ISOLATED_HAMZA: char = '\u{0621}';

/// Letter variants folded onto a canonical representative.
///
/// | From | To | Note |
/// |------|----|------|
/// | أ إ آ ٱ | ا | Hamza / madda / wasla on alif |
/// | ؤ | و | Hamza on waw |
/// | ئ | ي | Hamza on yeh |
/// | ة | ه | ta marbuta |
/// | ى | ي | alif maqsura |
const LETTER_FOLDS: &[(char, char)] = &[
    ('\u{0623}', '\u{0627}'),
    ('\u{0625}', '\u{0627}'),
    ('\u{0622}', '\u{0627}'),
    ('\u{0671}', '\u{0627}'),
    ('\u{0624}', '\u{0648}'),
    ('\u{0626}', '\u{064A}'),
    ('\u{0629}', '\u{0647}'),
    ('\u{0649}', '\u{064A}'),
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Remove all combining marks and tatweel, returning NFC text.
///
/// Decomposing first means precomposed letters such as أ lose their Hamza
/// mark as well, which is harmless since folding maps them to ا anyway.
///
/// ```
/// use reading_tutor::text::arabic::strip_diacritics;
///
/// assert_eq!(strip_diacritics("القِطَّةُ"), "القطة");
/// assert_eq!(strip_diacritics("كـــتاب"), "كتاب");
/// ```
pub fn strip_diacritics(text: &str) -> String {
    text.nfd()
        .filter(|&c| c != TATWEEL && !is_combining_mark(c))
        .nfc()
        .collect()
}

/// Fold Hamza seats and orthographic letter variants to canonical letters.
///
/// Folding can expose a bare alif followed by a combining Hamza or madda
/// that NFC would recompose into a foldable letter again, so the fold is
/// repeated until the text stops changing.  Every round that changes the
/// text consumes a combining mark or a foldable letter, so it terminates.
pub fn fold_letters(text: &str) -> String {
    let mut current: String = text.nfc().collect();
    loop {
        let folded: String = current
            .chars()
            .filter(|&c| c != ISOLATED_HAMZA)
            .map(fold_char)
            .collect::<String>()
            .nfc()
            .collect();
        if folded == current {
            return folded;
        }
        current = folded;
    }
}

/// Returns `true` if `text` carries any combining mark once decomposed.
pub fn has_diacritics(text: &str) -> bool {
    text.nfd().any(is_combining_mark)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

#[inline]
fn fold_char(c: char) -> char {
    LETTER_FOLDS
        .iter()
        .find(|(from, _)| *from == c)
        .map(|&(_, to)| to)
        .unwrap_or(c)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
