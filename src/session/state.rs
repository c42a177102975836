//! Session state machine data.
//!
//! ```text
//! start ──▶ InProgress ──correct check on last sentence──▶ Completed
//!               ▲   │
//!               └───┘ incorrect check (pointer stays, history grows)
//! ```
//!
//! A [`Session`] is only mutated by
//! [`SessionEngine::check_current_sentence`](super::SessionEngine::check_current_sentence);
//! its fields are therefore read-only from outside the crate.

use serde::{Deserialize, Serialize};

use crate::reading::ReadingResult;
use crate::session::story::Sentence;
use crate::text::Language;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// At least one sentence is still to be read correctly.
    InProgress,
    /// Every sentence has been read correctly; no further checks accepted.
    Completed,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::InProgress => "in progress",
            SessionState::Completed => "completed",
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState::InProgress
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Progress of one reader through one story.
///
/// Invariants maintained by the engine:
/// - `current_index <= story.len()`
/// - `state == Completed` exactly when `current_index == story.len()`
/// - `history` holds one entry per check, including failed attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub(crate) id: String,
    pub(crate) story: Vec<Sentence>,
    pub(crate) language: Language,
    pub(crate) current_index: usize,
    pub(crate) history: Vec<ReadingResult>,
    pub(crate) state: SessionState,
}

impl Session {
    pub(crate) fn new(id: String, story: Vec<Sentence>, language: Language) -> Self {
        Self {
            id,
            story,
            language,
            current_index: 0,
            history: Vec::new(),
            state: SessionState::InProgress,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn story(&self) -> &[Sentence] {
        &self.story
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// Index of the sentence the reader is on; equals the story length once
    /// completed.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn history(&self) -> &[ReadingResult] {
        &self.history
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// The sentence to read next, or `None` once completed.
    pub fn current_sentence(&self) -> Option<&Sentence> {
        self.story.get(self.current_index)
    }

    /// Percentage (0 – 100) of sentences read correctly so far.
    pub fn progress(&self) -> f64 {
        if self.story.is_empty() {
            return 0.0;
        }
        self.current_index as f64 / self.story.len() as f64 * 100.0
    }
}
