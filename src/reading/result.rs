//! Reading verdict types.

use serde::{Deserialize, Serialize};

use crate::text::Language;

// ---------------------------------------------------------------------------
// FeedbackType
// ---------------------------------------------------------------------------

/// Outcome category of one reading attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// Every expected word was read with adequate confidence.
    Success,
    /// An expected word has no counterpart in the transcript.
    Skip,
    /// An expected word was replaced by a different word.
    Mispronounce,
    /// The recognizer was unsure: either about the whole reading (correct,
    /// no error position) or about one substituted word (incorrect, with
    /// the position of the expected word).
    Hesitation,
}

impl FeedbackType {
    pub fn label(&self) -> &'static str {
        match self {
            FeedbackType::Success => "success",
            FeedbackType::Skip => "skip",
            FeedbackType::Mispronounce => "mispronounce",
            FeedbackType::Hesitation => "hesitation",
        }
    }
}

// ---------------------------------------------------------------------------
// ReadingMetadata
// ---------------------------------------------------------------------------

/// A word that matched only once diacritics were ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiacriticWarning {
    pub index: usize,
    pub word: String,
}

/// Optional diagnostics attached when the classifier is asked for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingMetadata {
    /// Recognizer confidence the verdict was computed with.
    pub confidence_score: f32,
    /// Alignment similarity in `[0, 1]`.
    pub matched_ratio: f64,
    /// Arabic lenient mode only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diacritic_warning: Option<DiacriticWarning>,
}

// ---------------------------------------------------------------------------
// ReadingResult
// ---------------------------------------------------------------------------

/// Verdict for one reading attempt.
///
/// `error_index` and `error_word` are set exactly when `is_correct` is
/// `false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadingResult {
    pub is_correct: bool,
    pub error_index: Option<usize>,
    pub error_word: Option<String>,
    pub feedback_type: FeedbackType,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ReadingMetadata>,
}

impl ReadingResult {
    pub fn success(language: Language) -> Self {
        Self::without_error(FeedbackType::Success, language)
    }

    pub fn hesitation(language: Language) -> Self {
        Self::without_error(FeedbackType::Hesitation, language)
    }

    /// A reading error at expected-word `index`.
    pub fn skip(index: usize, word: impl Into<String>, language: Language) -> Self {
        Self::with_error(FeedbackType::Skip, index, word.into(), language)
    }

    pub fn mispronounce(index: usize, word: impl Into<String>, language: Language) -> Self {
        Self::with_error(FeedbackType::Mispronounce, index, word.into(), language)
    }

    /// A substituted word the recognizer was unsure about.
    pub fn hesitation_at(index: usize, word: impl Into<String>, language: Language) -> Self {
        Self::with_error(FeedbackType::Hesitation, index, word.into(), language)
    }

    fn without_error(feedback_type: FeedbackType, language: Language) -> Self {
        Self {
            is_correct: true,
            error_index: None,
            error_word: None,
            feedback_type,
            language,
            metadata: None,
        }
    }

    fn with_error(feedback_type: FeedbackType, index: usize, word: String, language: Language) -> Self {
        Self {
            is_correct: false,
            error_index: Some(index),
            error_word: Some(word),
            feedback_type,
            language,
            metadata: None,
        }
    }
}
