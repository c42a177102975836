//! Supported reading languages and script-based detection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// First codepoint of the Arabic Unicode block.
const ARABIC_START: char = '\u{0600}';

/// Last codepoint of the Arabic Unicode block.
const ARABIC_END: char = '\u{06FF}';

/// Language of a sentence or story.
///
/// Serialised as its ISO-639-1 code (`"en"`, `"ar"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    /// ISO-639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Arabic => "ar",
        }
    }

    /// Guess the language of `text` from its script.
    ///
    /// Any character in the Arabic block (U+0600–U+06FF) makes the text
    /// Arabic; everything else, including empty text, is English.
    ///
    /// ```
    /// use reading_tutor::text::Language;
    ///
    /// assert_eq!(Language::detect("القطة تلعب"), Language::Arabic);
    /// assert_eq!(Language::detect("The cat sat"), Language::English);
    /// ```
    pub fn detect(text: &str) -> Self {
        if text.chars().any(is_arabic) {
            Language::Arabic
        } else {
            Language::English
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = TutorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ar" | "arabic" => Ok(Language::Arabic),
            other => Err(TutorError::validation(format!(
                "unsupported language '{other}' (expected 'en' or 'ar')"
            ))),
        }
    }
}

#[inline]
fn is_arabic(c: char) -> bool {
    (ARABIC_START..=ARABIC_END).contains(&c)
}
