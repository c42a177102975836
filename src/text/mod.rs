//! Bilingual text normalization.
//!
//! * [`Language`] — supported languages and script-based detection.
//! * [`normalize`] / [`tokenize`] — raw text → canonical tokens.
//! * [`arabic`] — tashkeel stripping and Hamza folding helpers.
//!
//! Everything here is pure and allocation-only; safe to call from any thread.

pub mod arabic;
pub mod language;
pub mod normalize;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use language::Language;
pub use normalize::{normalize, normalize_word, tokenize, Word};
