//! Store-backed session orchestration.
//!
//! [`SessionService`] wraps a [`SessionEngine`] and a [`SessionStore`] and
//! exposes the operations a front end needs: start, check (from a transcript
//! or from audio), summary and delete.  Sessions are addressed by id and
//! persisted under [`session_key`] after every check.
//!
//! Checks and deletes on the same session id are serialized with a per-id
//! async lock held across load → check → save, so two concurrent attempts
//! can never both read the same pointer and lose one history entry, and a
//! delete can never be undone by a check that loaded the session before it.
//! A lock lives in the table only while some call holds or awaits it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::TutorConfig;
use crate::error::TutorError;
use crate::reading::ReadingResult;
use crate::session::engine::{SessionEngine, SummaryStats};
use crate::session::state::Session;
use crate::session::store::{session_key, SessionStore, StoreError};
use crate::speech::{SpeechError, SpeechProvider};
use crate::text::Language;

// ---------------------------------------------------------------------------
// ServiceError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ServiceError {
    /// No live session with this id (never started, deleted or expired).
    #[error("session not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Tutor(#[from] TutorError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Speech(#[from] SpeechError),

    /// The per-session lock table was poisoned by a panicking thread.
    #[error("session lock table poisoned")]
    LockPoisoned,
}

// ---------------------------------------------------------------------------
// CheckOutcome
// ---------------------------------------------------------------------------

/// Verdict of one check plus where the reader stands afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    pub result: ReadingResult,
    pub current_index: usize,
    /// Text of the sentence to read next; `None` once the story is done.
    pub next_sentence: Option<String>,
    /// Percent of sentences completed (0 – 100).
    pub progress: f64,
    pub is_complete: bool,
}

impl CheckOutcome {
    fn new(result: ReadingResult, session: &Session) -> Self {
        Self {
            result,
            current_index: session.current_index(),
            next_sentence: session.current_sentence().map(|s| s.text()),
            progress: session.progress(),
            is_complete: session.is_completed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-session locks
// ---------------------------------------------------------------------------

type LockTable = Mutex<HashMap<String, Arc<AsyncMutex<()>>>>;

/// One caller's claim on a session's lock.  Dropping the last claim removes
/// the lock from the table.
struct SessionLock<'a> {
    table: &'a LockTable,
    id: String,
    lock: Arc<AsyncMutex<()>>,
}

impl Drop for SessionLock<'_> {
    fn drop(&mut self) {
        let Ok(mut table) = self.table.lock() else {
            return;
        };
        let registered = table
            .get(&self.id)
            .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock));
        // one reference in the table, one in this claim
        if registered && Arc::strong_count(&self.lock) == 2 {
            table.remove(&self.id);
        }
    }
}

// ---------------------------------------------------------------------------
// SessionService
// ---------------------------------------------------------------------------

pub struct SessionService {
    engine: SessionEngine,
    store: Arc<dyn SessionStore>,
    ttl: Option<Duration>,
    locks: LockTable,
}

impl SessionService {
    /// `ttl` of `None` keeps sessions until they are deleted.
    pub fn new(engine: SessionEngine, store: Arc<dyn SessionStore>, ttl: Option<Duration>) -> Self {
        Self {
            engine,
            store,
            ttl,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &TutorConfig, store: Arc<dyn SessionStore>) -> Self {
        Self::new(
            SessionEngine::from_config(config),
            store,
            Some(config.session.ttl()),
        )
    }

    pub fn engine(&self) -> &SessionEngine {
        &self.engine
    }

    /// Split `story_text`, start a session and persist it.
    pub async fn start(
        &self,
        story_text: &str,
        language: Option<Language>,
    ) -> Result<Session, ServiceError> {
        let session = self.engine.start_from_text(story_text, language)?;
        self.store
            .set(&session_key(session.id()), &session, self.ttl)
            .await?;
        Ok(session)
    }

    /// Load the session with `id`.
    pub async fn get(&self, id: &str) -> Result<Session, ServiceError> {
        self.store
            .get(&session_key(id))
            .await?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    /// Check `transcript` against the current sentence of session `id`.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::NotFound`] for an unknown or expired id.
    /// - [`ServiceError::Tutor`] wrapping [`TutorError::State`] when the
    ///   session is already completed.
    /// - [`ServiceError::Store`] when loading or saving fails; the stored
    ///   session is then unchanged.
    pub async fn check(
        &self,
        id: &str,
        transcript: &str,
        confidence: f32,
        strict: bool,
    ) -> Result<CheckOutcome, ServiceError> {
        self.check_with_word_confidences(id, transcript, confidence, &[], strict)
            .await
    }

    /// [`check`](Self::check) with one recognizer confidence per transcript
    /// word; an unsure substituted word is reported as hesitation.
    pub async fn check_with_word_confidences(
        &self,
        id: &str,
        transcript: &str,
        confidence: f32,
        word_confidences: &[f32],
        strict: bool,
    ) -> Result<CheckOutcome, ServiceError> {
        let claim = self.claim(id)?;
        let _guard = claim.lock.lock().await;

        let mut session = self.get(id).await?;
        let result = self.engine.check_with_word_confidences(
            &mut session,
            transcript,
            confidence,
            word_confidences,
            strict,
        )?;
        self.store
            .set(&session_key(id), &session, self.ttl)
            .await?;

        Ok(CheckOutcome::new(result, &session))
    }

    /// Transcribe `audio` with `provider`, then check the result, including
    /// any per-word confidences the provider reports.
    pub async fn check_audio(
        &self,
        id: &str,
        audio: &[u8],
        provider: &dyn SpeechProvider,
        strict: bool,
    ) -> Result<CheckOutcome, ServiceError> {
        let language = self.get(id).await?.language();
        let heard = provider
            .transcribe(audio, language)
            .await
            .map_err(|e| {
                log::warn!("session {id}: {} failed to transcribe: {e}", provider.name());
                e
            })?;
        log::debug!(
            "session {id}: {} heard {:?} (confidence {:.2})",
            provider.name(),
            heard.transcript,
            heard.confidence
        );
        self.check_with_word_confidences(
            id,
            &heard.transcript,
            heard.confidence,
            &heard.word_confidences,
            strict,
        )
        .await
    }

    pub async fn summary(&self, id: &str) -> Result<SummaryStats, ServiceError> {
        let session = self.get(id).await?;
        Ok(self.engine.summary(&session))
    }

    /// Remove session `id` from the store, after any check already running
    /// on it has saved.
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let claim = self.claim(id)?;
        let _guard = claim.lock.lock().await;

        if !self.store.delete(&session_key(id)).await? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        log::info!("session {id}: deleted");
        Ok(())
    }

    fn claim(&self, id: &str) -> Result<SessionLock<'_>, ServiceError> {
        let mut table = self.locks.lock().map_err(|_| ServiceError::LockPoisoned)?;
        let lock = table.entry(id.to_string()).or_default().clone();
        Ok(SessionLock {
            table: &self.locks,
            id: id.to_string(),
            lock,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::reading::FeedbackType;
    use crate::session::{InMemoryStore, SessionState};
    use crate::speech::{MockSpeechProvider, Transcription};

    const STORY: &str = "The cat sat on the mat. The dog ran fast. Birds sing songs.";

    fn service() -> SessionService {
        SessionService::new(
            SessionEngine::default(),
            Arc::new(InMemoryStore::new()),
            Some(Duration::from_secs(3600)),
        )
    }

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl SessionStore for BrokenStore {
        async fn get(&self, _key: &str) -> Result<Option<Session>, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn set(&self, _: &str, _: &Session, _: Option<Duration>) -> Result<(), StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
        async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
            Err(StoreError::Backend("connection refused".into()))
        }
    }

    /// In-memory store whose reads take 100 ms.
    #[derive(Default)]
    struct SlowReadStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl SessionStore for SlowReadStore {
        async fn get(&self, key: &str) -> Result<Option<Session>, StoreError> {
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.inner.get(key).await
        }
        async fn set(&self, key: &str, session: &Session, ttl: Option<Duration>) -> Result<(), StoreError> {
            self.inner.set(key, session, ttl).await
        }
        async fn delete(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.delete(key).await
        }
    }

    fn lock_entries(svc: &SessionService) -> usize {
        svc.locks.lock().unwrap().len()
    }

    #[tokio::test]
    async fn start_persists_session() {
        let svc = service();
        let started = svc.start(STORY, Some(Language::English)).await.unwrap();
        let loaded = svc.get(started.id()).await.unwrap();
        assert_eq!(loaded, started);
    }

    #[tokio::test]
    async fn start_with_empty_story_is_validation_error() {
        let err = service().start("  ", None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Tutor(TutorError::Validation(_))));
    }

    #[tokio::test]
    async fn check_persists_progress() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();

        let out = svc.check(&id, "the cat sat on the mat", 0.9, false).await.unwrap();
        assert!(out.result.is_correct);
        assert_eq!(out.current_index, 1);
        assert_eq!(out.next_sentence.as_deref(), Some("The dog ran fast"));
        assert!(!out.is_complete);
        assert!((out.progress - 100.0 / 3.0).abs() < 1e-9);

        let stored = svc.get(&id).await.unwrap();
        assert_eq!(stored.current_index(), 1);
        assert_eq!(stored.history().len(), 1);
    }

    #[tokio::test]
    async fn incorrect_check_keeps_sentence() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        let out = svc.check(&id, "the cat sat on the hat", 0.9, false).await.unwrap();
        assert_eq!(out.result.feedback_type, FeedbackType::Mispronounce);
        assert_eq!(out.current_index, 0);
        assert_eq!(out.next_sentence.as_deref(), Some("The cat sat on the mat"));
    }

    #[tokio::test]
    async fn finishing_story_then_checking_is_state_error() {
        let svc = service();
        let id = svc.start("Hi there.", None).await.unwrap().id().to_string();
        let out = svc.check(&id, "hi there", 1.0, false).await.unwrap();
        assert!(out.is_complete);
        assert!(out.next_sentence.is_none());
        assert_eq!(out.progress, 100.0);

        let err = svc.check(&id, "hi there", 1.0, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::Tutor(TutorError::State(_))));
        assert_eq!(svc.get(&id).await.unwrap().state(), SessionState::Completed);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.check("missing", "x", 1.0, false).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            svc.summary("missing").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
        assert!(matches!(
            svc.delete("missing").await.unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn delete_removes_session() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        svc.delete(&id).await.unwrap();
        assert!(matches!(svc.get(&id).await.unwrap_err(), ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn expired_session_is_not_found() {
        let svc = SessionService::new(
            SessionEngine::default(),
            Arc::new(InMemoryStore::new()),
            Some(Duration::ZERO),
        );
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        assert!(matches!(svc.get(&id).await.unwrap_err(), ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn summary_reflects_checks() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        svc.check(&id, "the cat on the mat", 0.9, false).await.unwrap();
        svc.check(&id, "the cat sat on the mat", 0.9, false).await.unwrap();

        let stats = svc.summary(&id).await.unwrap();
        assert_eq!(stats.attempts, 2);
        assert_eq!(stats.skip, 1);
        assert_eq!(stats.success, 1);
        assert!((stats.accuracy - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn check_audio_uses_provider_transcript() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        let provider = MockSpeechProvider::default()
            .with_script([Transcription::new("the cat sat on the mat", 0.4)]);

        let out = svc.check_audio(&id, b"pcm", &provider, false).await.unwrap();
        assert_eq!(out.result.feedback_type, FeedbackType::Hesitation);
        assert_eq!(out.current_index, 1);
    }

    #[tokio::test]
    async fn check_audio_surfaces_speech_error() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        let err = svc
            .check_audio(&id, &[], &MockSpeechProvider::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Speech(SpeechError::EmptyAudio)));
        assert!(svc.get(&id).await.unwrap().history().is_empty());
    }

    #[tokio::test]
    async fn store_failure_is_distinct_from_not_found() {
        let svc = SessionService::new(SessionEngine::default(), Arc::new(BrokenStore), None);
        assert!(matches!(
            svc.start(STORY, None).await.unwrap_err(),
            ServiceError::Store(StoreError::Backend(_))
        ));
        assert!(matches!(
            svc.check("any", "x", 1.0, false).await.unwrap_err(),
            ServiceError::Store(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_checks_on_one_session_are_serialized() {
        let svc = Arc::new(service());
        let id = svc.start(STORY, None).await.unwrap().id().to_string();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                svc.check(&id, "the cat on the mat", 0.9, false).await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }

        let stored = svc.get(&id).await.unwrap();
        assert_eq!(stored.history().len(), 8);
        assert_eq!(stored.current_index(), 0);
        assert_eq!(lock_entries(&svc), 0);
    }

    #[tokio::test]
    async fn delete_during_check_is_not_undone() {
        let svc = Arc::new(SessionService::new(
            SessionEngine::default(),
            Arc::new(SlowReadStore::default()),
            None,
        ));
        let id = svc.start(STORY, None).await.unwrap().id().to_string();

        let checking = {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            tokio::spawn(async move { svc.check(&id, "the cat sat on the mat", 0.9, false).await })
        };
        // the check is now inside its slow load
        tokio::time::sleep(Duration::from_millis(30)).await;
        svc.delete(&id).await.unwrap();

        let outcome = checking.await.unwrap().unwrap();
        assert_eq!(outcome.current_index, 1);
        assert!(matches!(svc.get(&id).await.unwrap_err(), ServiceError::NotFound(_)));
        assert_eq!(lock_entries(&svc), 0);
    }

    #[tokio::test]
    async fn lock_table_does_not_grow_with_unknown_ids() {
        let svc = service();
        for i in 0..1000 {
            let err = svc.check(&format!("missing-{i}"), "x", 1.0, false).await.unwrap_err();
            assert!(matches!(err, ServiceError::NotFound(_)));
        }
        assert_eq!(lock_entries(&svc), 0);
    }

    #[tokio::test]
    async fn lock_is_released_after_check_and_failed_delete() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        svc.check(&id, "the cat sat on the mat", 0.9, false).await.unwrap();
        assert_eq!(lock_entries(&svc), 0);

        svc.delete(&id).await.unwrap();
        assert!(svc.delete(&id).await.is_err());
        assert_eq!(lock_entries(&svc), 0);
    }

    #[tokio::test]
    async fn check_audio_passes_word_confidences() {
        let svc = service();
        let id = svc.start(STORY, None).await.unwrap().id().to_string();
        let provider = MockSpeechProvider::default().with_script([
            Transcription::new("the cat sat on the hat", 0.9)
                .with_word_confidences([0.9, 0.9, 0.9, 0.9, 0.9, 0.3]),
        ]);

        let out = svc.check_audio(&id, b"pcm", &provider, false).await.unwrap();
        assert_eq!(out.result.feedback_type, FeedbackType::Hesitation);
        assert_eq!(out.result.error_word.as_deref(), Some("mat"));
        assert_eq!(out.current_index, 0);
    }
}
