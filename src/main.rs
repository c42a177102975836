//! Console reading tutor.
//!
//! # Startup sequence
//!
//! 1. Parse the command line.
//! 2. Load [`TutorConfig`] from disk (defaults on first run or on error).
//! 3. Initialise logging with `[logging] level` as the default filter.
//! 4. Create a single-threaded [`tokio`] runtime.
//! 5. Start a session over the story file in an [`InMemoryStore`].
//! 6. Read one transcript per stdin line, check it and print the verdict,
//!    until the story is finished or stdin closes.
//! 7. Print the session summary.
//!
//! A line may start with a bracketed confidence, e.g. `[0.55] the cat sat`;
//! without one `[speech] default_confidence` is used.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use reading_tutor::{
    config::TutorConfig,
    reading::{FeedbackType, ReadingResult},
    session::{InMemoryStore, ServiceError, SessionService, SummaryStats},
    text::Language,
};

#[derive(Parser)]
#[command(name = "reading-tutor", version, about = "Read a story aloud, one sentence at a time")]
struct Cli {
    /// Story text file; sentences end at `.`, `!`, `?` or `؟`
    story: PathBuf,

    /// Story language (`en` or `ar`); detected from the text when omitted
    #[arg(short, long)]
    lang: Option<Language>,

    /// Require diacritics to match when reading Arabic
    #[arg(long)]
    strict: bool,

    /// Settings file to use instead of the platform default
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Configuration (before logging so the configured level applies)
    let loaded = match &cli.config {
        Some(path) => TutorConfig::load_from(path),
        None => TutorConfig::load(),
    };
    let (config, load_error) = match loaded {
        Ok(config) => (config, None),
        Err(e) => (TutorConfig::default(), Some(e)),
    };

    // 2. Logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .init();
    if let Some(e) = load_error {
        log::warn!("Failed to load config ({e:#}); using defaults");
    }

    // 3. Tokio runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(cli, config))
}

async fn run(cli: Cli, config: TutorConfig) -> Result<()> {
    let story_text = std::fs::read_to_string(&cli.story)
        .with_context(|| format!("failed to read story {}", cli.story.display()))?;

    let language = cli.lang.or_else(|| configured_language(&config.speech.language));
    let strict = cli.strict || config.reading.strict_mode_default;

    let service = SessionService::from_config(&config, Arc::new(InMemoryStore::new()));
    let session = service.start(&story_text, language).await?;
    let id = session.id().to_string();

    println!(
        "Story: {} sentences ({}{})",
        session.story().len(),
        session.language(),
        if strict { ", strict" } else { "" }
    );
    if let Some(first) = session.current_sentence() {
        println!("\nRead: {first}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let (confidence, transcript) = parse_line(&line, config.speech.default_confidence);
        match service.check(&id, transcript, confidence, strict).await {
            Ok(outcome) => {
                println!("{}", describe(&outcome.result));
                match outcome.next_sentence {
                    Some(next) => println!("\n[{:.0}%] Read: {next}", outcome.progress),
                    None => break,
                }
            }
            Err(ServiceError::Tutor(e)) => println!("! {e}"),
            Err(e) => return Err(e.into()),
        }
    }

    let stats = service.summary(&id).await?;
    print_summary(&stats);
    Ok(())
}

/// `"auto"` (or an unrecognised code) means detect from the story.
fn configured_language(code: &str) -> Option<Language> {
    if code.eq_ignore_ascii_case("auto") {
        return None;
    }
    match code.parse() {
        Ok(language) => Some(language),
        Err(e) => {
            log::warn!("Ignoring [speech] language ({e}); detecting from story");
            None
        }
    }
}

/// Split an optional `[confidence]` prefix off a transcript line.
fn parse_line(line: &str, default_confidence: f32) -> (f32, &str) {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('[') {
        if let Some((value, transcript)) = rest.split_once(']') {
            if let Ok(confidence) = value.trim().parse::<f32>() {
                return (confidence, transcript.trim());
            }
        }
    }
    (default_confidence, line.trim())
}

fn describe(result: &ReadingResult) -> String {
    let word = result.error_word.as_deref().unwrap_or("");
    let index = result.error_index.map(|i| i + 1).unwrap_or(0);
    match result.feedback_type {
        FeedbackType::Success => "  correct".to_string(),
        FeedbackType::Hesitation if result.is_correct => "  correct (take your time)".to_string(),
        FeedbackType::Hesitation => format!("  take your time with word {index}: \"{word}\", try again"),
        FeedbackType::Skip => format!("  skipped word {index}: \"{word}\", try again"),
        FeedbackType::Mispronounce => format!("  check word {index}: \"{word}\", try again"),
    }
}

fn print_summary(stats: &SummaryStats) {
    println!("\n--- Summary ---");
    println!(
        "Sentences: {}/{}",
        stats.completed_sentences, stats.total_sentences
    );
    println!("Attempts:  {}", stats.attempts);
    for feedback in [
        FeedbackType::Success,
        FeedbackType::Hesitation,
        FeedbackType::Skip,
        FeedbackType::Mispronounce,
    ] {
        println!("  {:<13}{}", feedback.label(), stats.count(feedback));
    }
    println!("Accuracy:  {:.0}%", stats.accuracy * 100.0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_reads_confidence_prefix() {
        assert_eq!(parse_line("[0.55] the cat sat", 1.0), (0.55, "the cat sat"));
        assert_eq!(parse_line("  [ 0.3 ]hi", 1.0), (0.3, "hi"));
    }

    #[test]
    fn parse_line_without_prefix_uses_default() {
        assert_eq!(parse_line("the cat sat ", 0.9), (0.9, "the cat sat"));
        assert_eq!(parse_line("[oops] the cat", 0.9), (0.9, "[oops] the cat"));
    }

    #[test]
    fn configured_language_auto_is_none() {
        assert_eq!(configured_language("auto"), None);
        assert_eq!(configured_language("ar"), Some(Language::Arabic));
        assert_eq!(configured_language("klingon"), None);
    }

    #[test]
    fn describe_names_the_word() {
        let r = reading_tutor::check_reading(
            "The cat sat on the mat",
            "The cat on the mat",
            0.9,
            Language::English,
            false,
        )
        .unwrap();
        assert!(describe(&r).contains("\"sat\""));
    }

    #[test]
    fn describe_word_hesitation_asks_for_retry() {
        let r = ReadingResult::hesitation_at(1, "cat", Language::English);
        let text = describe(&r);
        assert!(text.contains("\"cat\""));
        assert!(text.contains("try again"));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["reading-tutor", "--strict", "--lang", "ar", "story.txt"]);
        assert!(cli.strict);
        assert_eq!(cli.lang, Some(Language::Arabic));
        assert_eq!(cli.story, PathBuf::from("story.txt"));
    }
}
