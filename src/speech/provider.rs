//! Speech-to-text capability used by the session service.
//!
//! # Overview
//!
//! [`SpeechProvider`] is the only place audio enters the system.  The reading
//! core never looks at audio; it consumes the [`Transcription`] a provider
//! returns.  The trait is object-safe and `Send + Sync` so it can be held
//! behind an `Arc<dyn SpeechProvider>`.
//!
//! [`MockSpeechProvider`] replays a scripted list of transcriptions and then
//! falls back to a fixed default.  It stands in for a real recogniser in tests
//! and in the console driver.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::Language;

// ---------------------------------------------------------------------------
// SpeechError
// ---------------------------------------------------------------------------

/// Errors raised by a speech provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeechError {
    /// The audio payload was empty.
    #[error("audio payload is empty")]
    EmptyAudio,

    /// The provider does not handle the requested language.
    #[error("language not supported by {provider}: {language}")]
    UnsupportedLanguage { provider: String, language: Language },

    /// Recognition itself failed.
    #[error("transcription failed: {0}")]
    Transcription(String),
}

// ---------------------------------------------------------------------------
// Transcription
// ---------------------------------------------------------------------------

/// What a provider heard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub transcript: String,
    /// Recogniser confidence in `[0.0, 1.0]`.
    pub confidence: f32,
    /// Language the provider detected, when it reports one.
    pub language: Option<Language>,
    /// Confidence per whitespace-separated word of `transcript`; empty when
    /// the provider only reports an overall score.
    #[serde(default)]
    pub word_confidences: Vec<f32>,
}

impl Transcription {
    pub fn new(transcript: impl Into<String>, confidence: f32) -> Self {
        Self {
            transcript: transcript.into(),
            confidence,
            language: None,
            word_confidences: Vec::new(),
        }
    }

    pub fn with_word_confidences(mut self, word_confidences: impl Into<Vec<f32>>) -> Self {
        self.word_confidences = word_confidences.into();
        self
    }
}

// ---------------------------------------------------------------------------
// SpeechProvider trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech recognisers.
///
/// # Contract
///
/// - `audio` is an opaque encoded payload; its format is provider-specific.
/// - Returns `Err(SpeechError::EmptyAudio)` when `audio` is empty.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Transcribe `audio` spoken in `language`.
    async fn transcribe(&self, audio: &[u8], language: Language) -> Result<Transcription, SpeechError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

// Compile-time assertion: Box<dyn SpeechProvider> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechProvider>) {}
};

// ---------------------------------------------------------------------------
// MockSpeechProvider
// ---------------------------------------------------------------------------

/// Scripted provider: returns queued transcriptions in order, then the
/// default for every later call.
///
/// # Example
///
/// ```rust
/// # use reading_tutor::speech::{MockSpeechProvider, SpeechProvider, Transcription};
/// # use reading_tutor::text::Language;
/// # tokio_test_block(async {
/// let provider = MockSpeechProvider::new(Transcription::new("the end", 1.0))
///     .with_script([Transcription::new("the cat sat", 0.9)]);
///
/// let first = provider.transcribe(b"pcm", Language::English).await.unwrap();
/// assert_eq!(first.transcript, "the cat sat");
/// let second = provider.transcribe(b"pcm", Language::English).await.unwrap();
/// assert_eq!(second.transcript, "the end");
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct MockSpeechProvider {
    script: Mutex<VecDeque<Transcription>>,
    default: Transcription,
}

impl MockSpeechProvider {
    pub fn new(default: Transcription) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default,
        }
    }

    /// Queue `items` to be returned before the default.
    pub fn with_script(self, items: impl IntoIterator<Item = Transcription>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.extend(items);
        }
        self
    }

    /// Queue one more transcription.
    pub fn push(&self, item: Transcription) {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(item);
        }
    }

    /// Scripted transcriptions not yet returned.
    pub fn remaining(&self) -> usize {
        self.script.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl Default for MockSpeechProvider {
    fn default() -> Self {
        Self::new(Transcription::new("", 1.0))
    }
}

#[async_trait]
impl SpeechProvider for MockSpeechProvider {
    async fn transcribe(&self, audio: &[u8], language: Language) -> Result<Transcription, SpeechError> {
        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }
        let next = self
            .script
            .lock()
            .map_err(|_| SpeechError::Transcription("mock script lock poisoned".into()))?
            .pop_front();
        let mut out = next.unwrap_or_else(|| self.default.clone());
        out.language.get_or_insert(language);
        Ok(out)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
