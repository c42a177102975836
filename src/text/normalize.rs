//! Text normalization: raw sentence → canonical token sequence.
//!
//! # Pipeline (per whitespace-separated word)
//!
//! ```text
//! raw word ──NFC──▶ case-fold ──▶ [Arabic, lenient] strip tashkeel + tatweel
//!                                ──▶ [Arabic] fold Hamza seats
//!                                ──▶ trim surrounding punctuation
//!                                ──▶ token (dropped when empty)
//! ```
//!
//! Normalizing word by word keeps each token paired with the word it came
//! from, so verdicts can point at the word exactly as the reader saw it.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::TutorError;
use crate::text::arabic::{fold_letters, strip_diacritics};
use crate::text::Language;

// ---------------------------------------------------------------------------
// Word
// ---------------------------------------------------------------------------

/// A normalized token together with its source word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Word {
    /// The word as written (NFC, surrounding punctuation removed).
    pub source: String,
    /// The canonical comparison form.
    pub token: String,
    /// Index of the source word among the whitespace-separated words of
    /// the input, counting words that normalized to nothing.
    pub position: usize,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize `text` into its canonical token sequence.
///
/// # Errors
///
/// [`TutorError::Validation`] when `text` is empty or whitespace only.
///
/// # Examples
///
/// ```
/// use reading_tutor::text::{normalize, Language};
///
/// let tokens = normalize("The cat, sat!", Language::English, false).unwrap();
/// assert_eq!(tokens, vec!["the", "cat", "sat"]);
/// ```
pub fn normalize(text: &str, language: Language, strict: bool) -> Result<Vec<String>, TutorError> {
    Ok(tokenize(text, language, strict)?
        .into_iter()
        .map(|w| w.token)
        .collect())
}

/// Like [`normalize`] but keeps the source word for every token.
pub fn tokenize(text: &str, language: Language, strict: bool) -> Result<Vec<Word>, TutorError> {
    if text.trim().is_empty() {
        return Err(TutorError::validation("text must not be empty"));
    }

    let composed: String = text.nfc().collect();
    let words = composed
        .split_whitespace()
        .enumerate()
        .filter_map(|(position, raw)| {
            let token = normalize_word(raw, language, strict);
            if token.is_empty() {
                None
            } else {
                Some(Word {
                    source: trim_punctuation(raw).to_string(),
                    token,
                    position,
                })
            }
        })
        .collect();

    Ok(words)
}

/// Normalize a single whitespace-free word.  May return an empty string.
pub fn normalize_word(word: &str, language: Language, strict: bool) -> String {
    let folded: String = word
        .nfc()
        .collect::<String>()
        .to_lowercase()
        .nfc()
        .collect();

    let canonical = match language {
        Language::English => folded,
        Language::Arabic if strict => fold_letters(&folded),
        Language::Arabic => fold_letters(&strip_diacritics(&folded)),
    };

    trim_punctuation(&canonical).to_string()
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Combining marks belong to the letter before them and are never
/// punctuation, otherwise strict mode would lose a word's final vowel.
#[inline]
fn is_surrounding_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && !is_combining_mark(c)
}

fn trim_punctuation(word: &str) -> &str {
    word.trim_matches(is_surrounding_punctuation)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
