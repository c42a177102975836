//! Tutor settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and handed to the core
//! explicitly; nothing in the core reads configuration on its own.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ReadingConfig
// ---------------------------------------------------------------------------

/// Settings for the reading classifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    /// Recognizer confidence (0.0 – 1.0) below which a fully matched
    /// reading is reported as hesitation.
    pub hesitation_threshold: f32,
    /// Strictness used when the caller does not choose one.  Strict mode
    /// requires Arabic diacritics to match exactly (mastery phase).
    pub strict_mode_default: bool,
    /// Attach confidence, match ratio and diacritic warnings to results.
    pub include_metadata: bool,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            hesitation_threshold: 0.7,
            strict_mode_default: false,
            include_metadata: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Settings for story sessions and their storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds a stored session survives without being written again.
    pub ttl_secs: u64,
    /// Longest story, in sentences, a session accepts.
    pub max_sentences: usize,
}

impl SessionConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 3600,
            max_sentences: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeechConfig
// ---------------------------------------------------------------------------

/// Settings for the transcription input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Story language as an ISO-639-1 code, or `"auto"` to detect it from
    /// the story's script.
    pub language: String,
    /// Confidence assumed for transcripts that arrive without one.
    pub default_confidence: f32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            language: "auto".into(),
            default_confidence: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// TutorConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level configuration, serialised as `settings.toml`.
///
/// Missing sections and keys fall back to their defaults, so a partial file
/// only needs the values it changes.
///
/// ```rust,no_run
/// use reading_tutor::config::TutorConfig;
///
/// // Load (returns Default when file is missing)
/// let config = TutorConfig::load().unwrap();
/// assert!(config.reading.hesitation_threshold > 0.0);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub reading: ReadingConfig,
    pub session: SessionConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

impl TutorConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(TutorConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
