//! Sentence segmentation for playback
//!
//! Units end at a run of `.`, `!`, `?` or the Devanagari danda `।`. The
//! terminator run stays with the unit it ends, and whatever follows the
//! last terminator becomes a final unit, so concatenating the units always
//! gives back the input.

use once_cell::sync::Lazy;
use regex::Regex;

static SENTENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^.!?।]*[.!?।]+|[^.!?।]+").unwrap());

/// One playable unit of a session queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    /// Position in the queue, stable for the whole session
    pub index: usize,
    /// Text exactly as segmented (untrimmed)
    pub text: String,
}

impl Utterance {
    /// Text handed to the synthesizer
    pub fn speakable(&self) -> &str {
        self.text.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.speakable().is_empty()
    }
}

/// Split text into sentence-like units.
///
/// Text without any terminator (including the empty string) comes back as
/// a single unit. Nothing is trimmed or dropped.
pub fn segment(text: &str) -> Vec<String> {
    let units: Vec<String> = SENTENCE_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect();

    if units.is_empty() {
        vec![text.to_string()]
    } else {
        units
    }
}

/// Segment text into indexed utterances
pub fn utterances(text: &str) -> Vec<Utterance> {
    segment(text)
        .into_iter()
        .enumerate()
        .map(|(index, text)| Utterance { index, text })
        .collect()
}
