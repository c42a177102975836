//! Speech-to-text capability: provider trait, transcription type and a
//! scripted mock provider.

pub mod provider;

pub use provider::{MockSpeechProvider, SpeechError, SpeechProvider, Transcription};
