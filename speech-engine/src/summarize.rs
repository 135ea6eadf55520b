//! Article summarization with an offline fallback

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language::Language;
use crate::service::ServiceClient;

/// Sentence-like runs for the naive summarizer; newlines also end a run
static SUMMARY_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?\n]+[.!?\n]*").unwrap());

/// Default number of sentences kept by the naive summarizer
pub const DEFAULT_SUMMARY_SENTENCES: usize = 8;

/// First `count` sentence-like units of `text`, trimmed and joined by spaces.
///
/// Returns the text unchanged when it has no sentence-like units.
pub fn naive_summarize(text: &str, count: usize) -> String {
    let sentences: Vec<&str> = SUMMARY_SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .collect();

    if sentences.is_empty() {
        return text.to_string();
    }

    sentences
        .into_iter()
        .take(count)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Summarize remotely, falling back to [`naive_summarize`] on any failure
pub async fn summarize(
    client: &ServiceClient,
    text: &str,
    language: Language,
    fallback_sentences: usize,
) -> String {
    match client.summarize(text, language).await {
        Ok(summary) => summary,
        Err(e) => {
            log::warn!("Remote summarization failed, using naive summary: {}", e);
            naive_summarize(text, fallback_sentences)
        }
    }
}
