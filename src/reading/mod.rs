//! Reading classification.
//!
//! * [`Classifier`] — turns an expected sentence and a transcript into a verdict.
//! * [`check_reading`] — one-shot check with default settings.
//! * [`ReadingResult`] / [`FeedbackType`] — the verdict itself.

pub mod classifier;
pub mod result;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use classifier::{check_reading, Classifier, DEFAULT_HESITATION_THRESHOLD};
pub use result::{DiacriticWarning, FeedbackType, ReadingMetadata, ReadingResult};
