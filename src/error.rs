//! Error taxonomy for the reading core.
//!
//! Only two things can go wrong inside the core: the caller hands us text
//! we cannot read anything out of, or asks a finished session for another
//! check.  Everything else (storage, speech providers) has its own error
//! type next to the capability it belongs to.

use thiserror::Error;

/// Errors surfaced by the normalizer, classifier and session engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TutorError {
    /// Input text (sentence or story) is empty or contains nothing readable.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The operation is not allowed in the session's current state.
    #[error("invalid session state: {0}")]
    State(String),
}

impl TutorError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        Self::State(message.into())
    }
}
