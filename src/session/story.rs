//! Stories and the sentences they are read in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TutorError;

/// Characters that end a sentence when splitting a story.
const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', '\u{061F}'];

// ---------------------------------------------------------------------------
// Sentence
// ---------------------------------------------------------------------------

/// One sentence of a story: its raw words in reading order.
///
/// Immutable once built; the words keep their original spelling, case and
/// diacritics so the reader sees exactly what was printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sentence {
    words: Vec<String>,
}

impl Sentence {
    /// Build a sentence from raw text.
    ///
    /// # Errors
    ///
    /// [`TutorError::Validation`] when `text` is empty or whitespace only.
    pub fn new(text: &str) -> Result<Self, TutorError> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Err(TutorError::validation("sentence must not be empty"));
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The words joined by single spaces.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ---------------------------------------------------------------------------
// split_story
// ---------------------------------------------------------------------------

/// Split story text into sentences on runs of `.`, `!`, `?` and `؟`.
///
/// Fragments that are empty after trimming are dropped, so the result may
/// be empty.
///
/// ```
/// use reading_tutor::session::split_story;
///
/// let story = split_story("The cat sat. It was happy!  ");
/// assert_eq!(story.len(), 2);
/// assert_eq!(story[1].text(), "It was happy");
/// ```
pub fn split_story(text: &str) -> Vec<Sentence> {
    text.split(SENTENCE_TERMINATORS)
        .filter_map(|fragment| Sentence::new(fragment).ok())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentence_keeps_original_spelling() {
        let s = Sentence::new("  The Cat,  sat ").unwrap();
        assert_eq!(s.words(), &["The", "Cat,", "sat"]);
        assert_eq!(s.text(), "The Cat, sat");
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn empty_sentence_is_rejected() {
        assert!(matches!(
            Sentence::new(" \n").unwrap_err(),
            TutorError::Validation(_)
        ));
    }

    #[test]
    fn splits_on_runs_of_terminators() {
        let story = split_story("Run!! Stop?! Go... Done");
        let texts: Vec<String> = story.iter().map(Sentence::text).collect();
        assert_eq!(texts, vec!["Run", "Stop", "Go", "Done"]);
    }

    #[test]
    fn splits_on_arabic_question_mark() {
        let story = split_story("هل تلعب القطة؟ نعم تلعب.");
        assert_eq!(story.len(), 2);
        assert_eq!(story[0].text(), "هل تلعب القطة");
    }

    #[test]
    fn blank_story_yields_no_sentences() {
        assert!(split_story(" .. ! ").is_empty());
    }

    #[test]
    fn serialises_as_word_list() {
        let s = Sentence::new("the cat").unwrap();
        assert_eq!(serde_json::to_string(&s).unwrap(), r#"["the","cat"]"#);
    }
}
