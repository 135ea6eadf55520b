//! Sentence-sequenced speech playback
//!
//! Turns arbitrary English, Tamil or Hindi text into ordered utterances,
//! resolves a local synthesis voice for the requested language, and drives
//! playback one sentence at a time with resumable pause/stop. When no local
//! voice exists the whole text is rendered remotely and played as one unit.

pub mod cloud;
pub mod error;
pub mod language;
pub mod narrator;
pub mod platform;
pub mod script;
pub mod segment;
pub mod sequencer;
pub mod service;
pub mod summarize;
pub mod translate;
pub mod voice;

#[cfg(test)]
mod mock;

pub use cloud::{AudioPlayback, AudioSink, CloudFallbackPlayer, SpeechRenderer};
pub use error::{EngineError, PlatformError, Result};
pub use language::Language;
pub use narrator::{Narrator, Route};
pub use platform::{SpeakRequest, SpeechPlatform};
pub use script::{Script, has_target_script};
pub use segment::{Utterance, segment, utterances};
pub use sequencer::{PlaybackController, PlaybackOutcome, PlaybackStatus};
pub use service::{Article, ServiceClient};
pub use summarize::{naive_summarize, summarize};
pub use translate::{LlmTranslation, ProviderTranslation, TranslationStrategy, Translator};
pub use voice::{
    DEFAULT_CATALOG_WAIT, VoiceDescriptor, has_voice_for, resolve_strict, resolve_voice,
    wait_for_catalog,
};
