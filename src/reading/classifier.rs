//! Reading classifier: expected sentence + transcript → [`ReadingResult`].
//!
//! # Decision order
//!
//! ```text
//! normalize both ──▶ align ──▶ first Delete in expected order?     → Skip
//!                            ─▶ first Substitute in expected order?
//!                                 spoken word confidence < threshold? → Hesitation (at that word)
//!                                 otherwise                           → Mispronounce
//!                            ─▶ confidence < threshold (or not finite)? → Hesitation
//!                            ─▶                                     → Success
//! ```
//!
//! Insertions never produce a verdict: the child is judged only on the
//! words of the expected sentence.

use crate::align::{align, matched_ratio, AlignmentOp};
use crate::config::ReadingConfig;
use crate::error::TutorError;
use crate::reading::result::{DiacriticWarning, ReadingMetadata, ReadingResult};
use crate::text::arabic::has_diacritics;
use crate::text::{normalize_word, tokenize, Language, Word};

/// Confidence below which a fully matched reading counts as hesitant.
pub const DEFAULT_HESITATION_THRESHOLD: f32 = 0.7;

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies reading attempts against a fixed hesitation threshold.
///
/// Cheap to construct and `Copy`; holds no state between calls.
///
/// # Example
///
/// ```
/// use reading_tutor::reading::{Classifier, FeedbackType};
/// use reading_tutor::text::Language;
///
/// let classifier = Classifier::default();
/// let result = classifier
///     .classify("The cat sat", "the cat", 0.9, Language::English, false)
///     .unwrap();
/// assert_eq!(result.feedback_type, FeedbackType::Skip);
/// assert_eq!(result.error_word.as_deref(), Some("sat"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier {
    hesitation_threshold: f32,
    include_metadata: bool,
}

impl Classifier {
    pub fn new(hesitation_threshold: f32) -> Self {
        Self {
            hesitation_threshold,
            include_metadata: false,
        }
    }

    pub fn from_config(config: &ReadingConfig) -> Self {
        Self {
            hesitation_threshold: config.hesitation_threshold,
            include_metadata: config.include_metadata,
        }
    }

    /// Attach [`ReadingMetadata`] to every result.
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }

    pub fn hesitation_threshold(&self) -> f32 {
        self.hesitation_threshold
    }

    /// Classify one reading attempt with a single overall confidence.
    ///
    /// An empty or whitespace-only `transcript` is a valid input: every
    /// expected word is then missing and the first one is reported as a skip.
    ///
    /// # Errors
    ///
    /// [`TutorError::Validation`] when `expected` is empty or normalizes to
    /// no words at all.
    pub fn classify(
        &self,
        expected: &str,
        transcript: &str,
        confidence: f32,
        language: Language,
        strict: bool,
    ) -> Result<ReadingResult, TutorError> {
        self.classify_with_word_confidences(expected, transcript, confidence, &[], language, strict)
    }

    /// Like [`classify`](Self::classify), with one recognizer confidence per
    /// whitespace-separated word of `transcript`.
    ///
    /// When the first error is a substitution and the spoken word's
    /// confidence is below the threshold, the verdict is an incorrect
    /// [`Hesitation`](crate::reading::FeedbackType::Hesitation) at that
    /// expected word instead of a mispronunciation.  Words without a
    /// confidence (short or empty slice) are judged as usual.
    pub fn classify_with_word_confidences(
        &self,
        expected: &str,
        transcript: &str,
        confidence: f32,
        word_confidences: &[f32],
        language: Language,
        strict: bool,
    ) -> Result<ReadingResult, TutorError> {
        let expected_words = tokenize(expected, language, strict)?;
        if expected_words.is_empty() {
            return Err(TutorError::validation(
                "expected sentence contains no readable words",
            ));
        }

        let actual_words = if transcript.trim().is_empty() {
            Vec::new()
        } else {
            tokenize(transcript, language, strict)?
        };

        let expected_tokens: Vec<&str> = expected_words.iter().map(|w| w.token.as_str()).collect();
        let actual_tokens: Vec<&str> = actual_words.iter().map(|w| w.token.as_str()).collect();
        let ops = align(&expected_tokens, &actual_tokens);

        let first_error = ops.iter().find_map(|op| match *op {
            AlignmentOp::Delete { expected } => Some((expected, None)),
            AlignmentOp::Substitute { expected, actual } => Some((expected, Some(actual))),
            _ => None,
        });

        let mut result = match first_error {
            Some((index, None)) => {
                ReadingResult::skip(index, display_word(&expected_words[index], language), language)
            }
            Some((index, Some(actual))) => {
                let word = display_word(&expected_words[index], language);
                let heard_confidence = word_confidences.get(actual_words[actual].position);
                if heard_confidence.is_some_and(|&c| self.is_hesitant(c)) {
                    ReadingResult::hesitation_at(index, word, language)
                } else {
                    ReadingResult::mispronounce(index, word, language)
                }
            }
            None if self.is_hesitant(confidence) => ReadingResult::hesitation(language),
            None => ReadingResult::success(language),
        };

        log::debug!(
            "classify: {} (expected {} words, heard {}, confidence {confidence:.2})",
            result.feedback_type.label(),
            expected_tokens.len(),
            actual_tokens.len(),
        );

        if self.include_metadata {
            let diacritic_warning = if language == Language::Arabic && !strict {
                find_diacritic_warning(&ops, &expected_words, &actual_words)
            } else {
                None
            };
            result.metadata = Some(ReadingMetadata {
                confidence_score: confidence,
                matched_ratio: matched_ratio(&ops, expected_tokens.len(), actual_tokens.len()),
                diacritic_warning,
            });
        }

        Ok(result)
    }

    /// A missing (NaN) or nonsensical (infinite) score counts as unsure.
    fn is_hesitant(&self, confidence: f32) -> bool {
        !confidence.is_finite() || confidence < self.hesitation_threshold
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_HESITATION_THRESHOLD)
    }
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Check one sentence with the default hesitation threshold.
///
/// ```
/// use reading_tutor::reading::{check_reading, FeedbackType};
/// use reading_tutor::text::Language;
///
/// let r = check_reading(
///     "The cat sat on the mat",
///     "The cat sat on the hat",
///     0.85,
///     Language::English,
///     false,
/// )
/// .unwrap();
/// assert!(!r.is_correct);
/// assert_eq!(r.error_index, Some(5));
/// assert_eq!(r.error_word.as_deref(), Some("mat"));
/// assert_eq!(r.feedback_type, FeedbackType::Mispronounce);
/// ```
pub fn check_reading(
    expected_sentence: &str,
    speech_transcript: &str,
    stt_confidence: f32,
    language: Language,
    strict_mode: bool,
) -> Result<ReadingResult, TutorError> {
    Classifier::default().classify(
        expected_sentence,
        speech_transcript,
        stt_confidence,
        language,
        strict_mode,
    )
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Arabic words are shown as printed (with their vowel marks); English
/// words in their normalized form.
fn display_word(word: &Word, language: Language) -> String {
    match language {
        Language::Arabic => word.source.clone(),
        Language::English => word.token.clone(),
    }
}

/// First matched word whose vowelled transcript form disagrees with the
/// vowelled expected form.  Bare transcript words never warn.
fn find_diacritic_warning(
    ops: &[AlignmentOp],
    expected: &[Word],
    actual: &[Word],
) -> Option<DiacriticWarning> {
    ops.iter().find_map(|op| {
        let AlignmentOp::Match {
            expected: e,
            actual: a,
        } = *op
        else {
            return None;
        };
        let heard = &actual[a].source;
        if !has_diacritics(heard) {
            return None;
        }
        let written = &expected[e].source;
        let differs = normalize_word(written, Language::Arabic, true)
            != normalize_word(heard, Language::Arabic, true);
        differs.then(|| DiacriticWarning {
            index: e,
            word: written.clone(),
        })
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
