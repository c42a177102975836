//! Configuration module for the reading tutor.
//!
//! Provides `TutorConfig` (top-level settings), sub-configs for each
//! concern, `AppPaths` for the platform config directory, and TOML
//! persistence via `TutorConfig::load` / `TutorConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{LoggingConfig, ReadingConfig, SessionConfig, SpeechConfig, TutorConfig};
