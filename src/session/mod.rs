//! Reading sessions: stories, session state, the engine that advances it,
//! and store-backed orchestration.

pub mod engine;
pub mod service;
pub mod state;
pub mod store;
pub mod story;

pub use engine::{summarize, SessionEngine, SummaryStats, DEFAULT_MAX_SENTENCES};
pub use service::{CheckOutcome, ServiceError, SessionService};
pub use state::{Session, SessionState};
pub use store::{session_key, InMemoryStore, SessionStore, StoreError};
pub use story::{split_story, Sentence};
