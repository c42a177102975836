//! Reading tutor core: checks a child's spoken reading of a sentence against
//! the printed text and walks them through a story sentence by sentence.
//!
//! # Layers
//!
//! | Module      | Role                                                        |
//! |-------------|-------------------------------------------------------------|
//! | [`text`]    | Language detection and English / Arabic normalization       |
//! | [`align`]   | Word-level alignment of expected vs. spoken tokens          |
//! | [`reading`] | Verdict per attempt: success, skip, mispronounce, hesitation|
//! | [`session`] | Story state machine, storage capability, session service    |
//! | [`speech`]  | Speech-to-text capability and a scripted mock provider      |
//! | [`config`]  | `settings.toml` persistence                                 |
//!
//! # Quick start
//!
//! ```
//! use reading_tutor::{check_current_sentence, check_reading, session_summary, start_session};
//! use reading_tutor::reading::FeedbackType;
//! use reading_tutor::text::Language;
//!
//! let r = check_reading("The cat sat on the mat", "The cat sat on the hat", 0.85, Language::English, false)?;
//! assert_eq!(r.feedback_type, FeedbackType::Mispronounce);
//! assert_eq!(r.error_index, Some(5));
//!
//! let mut session = start_session("The cat sat. The dog ran.", Language::English)?;
//! check_current_sentence(&mut session, "the cat sat", 0.9, false)?;
//! assert_eq!(session_summary(&session).success, 1);
//! # Ok::<(), reading_tutor::TutorError>(())
//! ```

pub mod align;
pub mod config;
pub mod error;
pub mod reading;
pub mod session;
pub mod speech;
pub mod text;

pub use error::TutorError;
pub use reading::{check_reading, FeedbackType, ReadingResult};
pub use session::{Session, SessionEngine, SessionState, SummaryStats};
pub use text::Language;

/// Split `story_text` into sentences and start a session with default
/// settings.
///
/// # Errors
///
/// [`TutorError::Validation`] for an empty story, a story longer than
/// [`session::DEFAULT_MAX_SENTENCES`], or one with no readable words.
pub fn start_session(story_text: &str, language: Language) -> Result<Session, TutorError> {
    SessionEngine::default().start_from_text(story_text, Some(language))
}

/// Check `speech_transcript` against the current sentence of `session` with
/// the default classifier, advancing on a correct reading.
///
/// # Errors
///
/// [`TutorError::State`] once the session is completed.
pub fn check_current_sentence(
    session: &mut Session,
    speech_transcript: &str,
    stt_confidence: f32,
    strict_mode: bool,
) -> Result<ReadingResult, TutorError> {
    SessionEngine::default().check_current_sentence(session, speech_transcript, stt_confidence, strict_mode)
}

/// Counts per feedback type and accuracy over the session's history.
pub fn session_summary(session: &Session) -> SummaryStats {
    session::summarize(session)
}
