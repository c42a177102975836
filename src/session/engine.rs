//! Session engine: drives the classifier through a story.
//!
//! [`SessionEngine`] is stateless apart from its settings; every call takes
//! the [`Session`] it works on.  Checks on one session must not run
//! concurrently; callers that share sessions serialize them per id (see
//! [`SessionService`](super::SessionService)).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TutorConfig;
use crate::error::TutorError;
use crate::reading::{Classifier, FeedbackType, ReadingResult};
use crate::session::state::{Session, SessionState};
use crate::session::story::{split_story, Sentence};
use crate::text::{normalize, Language};

/// Longest story accepted when no configuration says otherwise.
pub const DEFAULT_MAX_SENTENCES: usize = 1000;

// ---------------------------------------------------------------------------
// SummaryStats
// ---------------------------------------------------------------------------

/// Aggregate view of a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_sentences: usize,
    pub completed_sentences: usize,
    /// Number of checks made, including failed attempts.
    pub attempts: usize,
    pub success: usize,
    pub skip: usize,
    pub mispronounce: usize,
    pub hesitation: usize,
    /// Share of attempts (0.0 – 1.0) judged correct; `0.0` before the
    /// first attempt.
    pub accuracy: f64,
}

impl SummaryStats {
    pub fn count(&self, feedback: FeedbackType) -> usize {
        match feedback {
            FeedbackType::Success => self.success,
            FeedbackType::Skip => self.skip,
            FeedbackType::Mispronounce => self.mispronounce,
            FeedbackType::Hesitation => self.hesitation,
        }
    }

    /// Skipped or mispronounced words.
    pub fn errors(&self) -> usize {
        self.skip + self.mispronounce
    }
}

// ---------------------------------------------------------------------------
// SessionEngine
// ---------------------------------------------------------------------------

/// Starts sessions, checks sentences and summarizes progress.
///
/// # Example
///
/// ```
/// use reading_tutor::session::{SessionEngine, SessionState};
/// use reading_tutor::text::Language;
///
/// let engine = SessionEngine::default();
/// let mut session = engine
///     .start_from_text("The cat sat. The dog ran.", Some(Language::English))
///     .unwrap();
///
/// engine.check_current_sentence(&mut session, "the cat sat", 0.9, false).unwrap();
/// engine.check_current_sentence(&mut session, "the dog ran", 0.9, false).unwrap();
/// assert_eq!(session.state(), SessionState::Completed);
/// ```
#[derive(Debug, Clone)]
pub struct SessionEngine {
    classifier: Classifier,
    max_sentences: usize,
}

impl SessionEngine {
    pub fn new(classifier: Classifier, max_sentences: usize) -> Self {
        Self {
            classifier,
            max_sentences,
        }
    }

    pub fn from_config(config: &TutorConfig) -> Self {
        Self::new(
            Classifier::from_config(&config.reading),
            config.session.max_sentences,
        )
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Start a session over an already-split story.
    ///
    /// # Errors
    ///
    /// [`TutorError::Validation`] when the story is empty, longer than the
    /// configured maximum, or contains a sentence with no readable words.
    pub fn start(&self, story: Vec<Sentence>, language: Language) -> Result<Session, TutorError> {
        if story.is_empty() {
            return Err(TutorError::validation(
                "story must contain at least one sentence",
            ));
        }
        if story.len() > self.max_sentences {
            return Err(TutorError::validation(format!(
                "story too long: {} sentences (maximum {})",
                story.len(),
                self.max_sentences
            )));
        }
        for (i, sentence) in story.iter().enumerate() {
            if normalize(&sentence.text(), language, false)?.is_empty() {
                return Err(TutorError::validation(format!(
                    "sentence {i} contains no readable words"
                )));
            }
        }

        let session = Session::new(Uuid::new_v4().to_string(), story, language);
        log::info!(
            "session {}: started with {} sentences, language={}",
            session.id(),
            session.story().len(),
            language
        );
        Ok(session)
    }

    /// Split `story_text` into sentences and start a session over them.
    ///
    /// When `language` is `None` it is detected from the text.  Fragments
    /// with no readable words (stray punctuation) are dropped.
    pub fn start_from_text(
        &self,
        story_text: &str,
        language: Option<Language>,
    ) -> Result<Session, TutorError> {
        if story_text.trim().is_empty() {
            return Err(TutorError::validation("story must not be empty"));
        }
        let language = language.unwrap_or_else(|| Language::detect(story_text));
        let story: Vec<Sentence> = split_story(story_text)
            .into_iter()
            .filter(|s| {
                normalize(&s.text(), language, false)
                    .map(|tokens| !tokens.is_empty())
                    .unwrap_or(false)
            })
            .collect();
        self.start(story, language)
    }

    /// Check `transcript` against the session's current sentence.
    ///
    /// The result is always appended to the history.  A correct reading
    /// (success or hesitation) moves to the next sentence; any other verdict
    /// keeps the reader on the same sentence for another attempt.
    ///
    /// # Errors
    ///
    /// - [`TutorError::State`] when the session is already completed.
    /// - [`TutorError::Validation`] from the classifier.
    pub fn check_current_sentence(
        &self,
        session: &mut Session,
        transcript: &str,
        confidence: f32,
        strict: bool,
    ) -> Result<ReadingResult, TutorError> {
        self.check_with_word_confidences(session, transcript, confidence, &[], strict)
    }

    /// [`check_current_sentence`](Self::check_current_sentence) with one
    /// recognizer confidence per transcript word; see
    /// [`Classifier::classify_with_word_confidences`].
    pub fn check_with_word_confidences(
        &self,
        session: &mut Session,
        transcript: &str,
        confidence: f32,
        word_confidences: &[f32],
        strict: bool,
    ) -> Result<ReadingResult, TutorError> {
        if session.is_completed() {
            return Err(TutorError::state(format!(
                "session {} is already completed",
                session.id
            )));
        }
        let Some(sentence) = session.current_sentence() else {
            return Err(TutorError::state(format!(
                "session {} has no sentence at index {}",
                session.id, session.current_index
            )));
        };

        let result = self.classifier.classify_with_word_confidences(
            &sentence.text(),
            transcript,
            confidence,
            word_confidences,
            session.language,
            strict,
        )?;

        session.history.push(result.clone());
        if result.is_correct {
            session.current_index += 1;
        }
        log::debug!(
            "session {}: {} → sentence {}/{}",
            session.id,
            result.feedback_type.label(),
            session.current_index,
            session.story.len()
        );

        if session.current_index == session.story.len() {
            session.state = SessionState::Completed;
            log::info!(
                "session {}: completed after {} attempts",
                session.id,
                session.history.len()
            );
        }

        Ok(result)
    }

    /// Aggregate counts and accuracy over the session's history.
    pub fn summary(&self, session: &Session) -> SummaryStats {
        summarize(session)
    }
}

impl Default for SessionEngine {
    fn default() -> Self {
        Self::new(Classifier::default(), DEFAULT_MAX_SENTENCES)
    }
}

/// Aggregate counts and accuracy over `session`'s history.
pub fn summarize(session: &Session) -> SummaryStats {
    let mut stats = SummaryStats {
        total_sentences: session.story().len(),
        completed_sentences: session.current_index(),
        attempts: session.history().len(),
        success: 0,
        skip: 0,
        mispronounce: 0,
        hesitation: 0,
        accuracy: 0.0,
    };

    let mut correct = 0;
    for result in session.history() {
        if result.is_correct {
            correct += 1;
        }
        match result.feedback_type {
            FeedbackType::Success => stats.success += 1,
            FeedbackType::Skip => stats.skip += 1,
            FeedbackType::Mispronounce => stats.mispronounce += 1,
            FeedbackType::Hesitation => stats.hesitation += 1,
        }
    }

    if stats.attempts > 0 {
        stats.accuracy = correct as f64 / stats.attempts as f64;
    }
    stats
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const STORY: &str = "The cat sat on the mat. The dog ran fast. Birds sing songs.";

    fn started() -> (SessionEngine, Session) {
        let engine = SessionEngine::default();
        let session = engine
            .start_from_text(STORY, Some(Language::English))
            .expect("start");
        (engine, session)
    }

    // --- start --------------------------------------------------------------

    #[test]
    fn start_splits_story_into_sentences() {
        let (_, session) = started();
        assert_eq!(session.story().len(), 3);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.state(), SessionState::InProgress);
        assert!(!session.id().is_empty());
    }

    #[test]
    fn sessions_get_distinct_ids() {
        let engine = SessionEngine::default();
        let a = engine.start_from_text(STORY, None).unwrap();
        let b = engine.start_from_text(STORY, None).unwrap();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn start_rejects_empty_story() {
        let engine = SessionEngine::default();
        assert!(matches!(
            engine.start(Vec::new(), Language::English).unwrap_err(),
            TutorError::Validation(_)
        ));
        assert!(matches!(
            engine.start_from_text("   ", None).unwrap_err(),
            TutorError::Validation(_)
        ));
        assert!(matches!(
            engine.start_from_text("... !!", None).unwrap_err(),
            TutorError::Validation(_)
        ));
    }

    #[test]
    fn start_rejects_story_over_limit() {
        let engine = SessionEngine::new(Classifier::default(), 2);
        let err = engine.start_from_text(STORY, None).unwrap_err();
        assert!(err.to_string().contains("too long"));
    }

    #[test]
    fn start_rejects_unreadable_sentence() {
        let engine = SessionEngine::default();
        let story = vec![Sentence::new("hello").unwrap(), Sentence::new("-- ,").unwrap()];
        assert!(matches!(
            engine.start(story, Language::English).unwrap_err(),
            TutorError::Validation(_)
        ));
    }

    #[test]
    fn start_from_text_detects_language() {
        let engine = SessionEngine::default();
        let session = engine.start_from_text("القطة تلعب. الولد يقرأ.", None).unwrap();
        assert_eq!(session.language(), Language::Arabic);
        assert_eq!(session.story().len(), 2);
    }

    // --- check_current_sentence ---------------------------------------------

    #[test]
    fn three_correct_checks_complete_the_story() {
        let (engine, mut session) = started();
        for (i, transcript) in ["the cat sat on the mat", "the dog ran fast", "birds sing songs"]
            .iter()
            .enumerate()
        {
            assert_eq!(session.current_index(), i);
            assert_eq!(session.state(), SessionState::InProgress);
            let r = engine
                .check_current_sentence(&mut session, transcript, 0.9, false)
                .unwrap();
            assert!(r.is_correct);
        }
        assert_eq!(session.current_index(), 3);
        assert_eq!(session.state(), SessionState::Completed);
        assert!(session.current_sentence().is_none());
    }

    #[test]
    fn incorrect_check_does_not_advance() {
        let (engine, mut session) = started();
        let r = engine
            .check_current_sentence(&mut session, "the cat on the mat", 0.9, false)
            .unwrap();
        assert_eq!(r.feedback_type, FeedbackType::Skip);
        assert_eq!(session.current_index(), 0);
        assert_eq!(session.history().len(), 1);

        // retry the same sentence
        let r = engine
            .check_current_sentence(&mut session, "the cat sat on the mat", 0.9, false)
            .unwrap();
        assert!(r.is_correct);
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.history().len(), 2);
    }

    #[test]
    fn hesitation_advances_the_pointer() {
        let (engine, mut session) = started();
        let r = engine
            .check_current_sentence(&mut session, "the cat sat on the mat", 0.2, false)
            .unwrap();
        assert_eq!(r.feedback_type, FeedbackType::Hesitation);
        assert_eq!(session.current_index(), 1);
    }

    #[test]
    fn check_on_completed_session_is_state_error() {
        let engine = SessionEngine::default();
        let mut session = engine.start_from_text("Hi there.", None).unwrap();
        engine
            .check_current_sentence(&mut session, "hi there", 0.9, false)
            .unwrap();
        let err = engine
            .check_current_sentence(&mut session, "hi there", 0.9, false)
            .unwrap_err();
        assert!(matches!(err, TutorError::State(_)));
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn strict_mode_is_applied_per_check() {
        let engine = SessionEngine::default();
        let mut session = engine
            .start_from_text("القِطَّةُ تَلْعَبُ.", Some(Language::Arabic))
            .unwrap();
        let strict = engine
            .check_current_sentence(&mut session, "القطة تلعب", 0.9, true)
            .unwrap();
        assert_eq!(strict.feedback_type, FeedbackType::Mispronounce);
        let lenient = engine
            .check_current_sentence(&mut session, "القطة تلعب", 0.9, false)
            .unwrap();
        assert_eq!(lenient.feedback_type, FeedbackType::Success);
        assert!(session.is_completed());
    }

    #[test]
    fn unsure_word_hesitation_keeps_the_sentence() {
        let (engine, mut session) = started();
        let r = engine
            .check_with_word_confidences(
                &mut session,
                "the cat sat on the hat",
                0.9,
                &[0.9, 0.9, 0.9, 0.9, 0.9, 0.2],
                false,
            )
            .unwrap();
        assert_eq!(r.feedback_type, FeedbackType::Hesitation);
        assert!(!r.is_correct);
        assert_eq!(session.current_index(), 0);

        let stats = engine.summary(&session);
        assert_eq!(stats.hesitation, 1);
        assert_eq!(stats.accuracy, 0.0);
    }

    // --- summary ------------------------------------------------------------

    #[test]
    fn summary_of_empty_history_is_zero() {
        let (engine, session) = started();
        let stats = engine.summary(&session);
        assert_eq!(stats.accuracy, 0.0);
        assert_eq!(stats.attempts, 0);
        for ft in [
            FeedbackType::Success,
            FeedbackType::Skip,
            FeedbackType::Mispronounce,
            FeedbackType::Hesitation,
        ] {
            assert_eq!(stats.count(ft), 0);
        }
        assert_eq!(stats.total_sentences, 3);
    }

    #[test]
    fn summary_counts_each_feedback_type() {
        let (engine, mut session) = started();
        let checks = [
            ("the cat on the mat", 0.9),     // skip
            ("the cat sat on the hat", 0.9), // mispronounce
            ("the cat sat on the mat", 0.3), // hesitation → advance
            ("the dog ran fast", 0.9),       // success → advance
        ];
        for (t, c) in checks {
            engine.check_current_sentence(&mut session, t, c, false).unwrap();
        }

        let stats = engine.summary(&session);
        assert_eq!(stats.attempts, 4);
        assert_eq!(stats.skip, 1);
        assert_eq!(stats.mispronounce, 1);
        assert_eq!(stats.hesitation, 1);
        assert_eq!(stats.success, 1);
        assert_eq!(stats.errors(), 2);
        assert_eq!(stats.completed_sentences, 2);
        assert!((stats.accuracy - 0.5).abs() < 1e-9);
    }
}
