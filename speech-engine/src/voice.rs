//! Voice resolution against a platform voice catalog
//!
//! Matching is tiered: exact locale first, then primary language subtag.
//! Only the non-strict lookup falls back to the first voice in the catalog.

use std::time::Duration;

use crate::language::Language;
use crate::platform::SpeechPlatform;

/// How long to wait for an empty catalog to populate
pub const DEFAULT_CATALOG_WAIT: Duration = Duration::from_millis(900);

/// Represents an available synthesis voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    /// Platform voice identifier
    pub name: String,
    /// Locale tag as reported by the platform (e.g., "hi-IN" or "en_US")
    pub locale: String,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locale: locale.into(),
        }
    }

    /// Locale lower-cased with `_` separators turned into `-`
    pub fn normalized_locale(&self) -> String {
        self.locale.trim().replace('_', "-").to_lowercase()
    }

    /// Primary language subtag (e.g., "hi" for "hi-IN")
    pub fn language_prefix(&self) -> String {
        self.normalized_locale()
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string()
    }
}

/// Resolve a voice without guessing: exact locale, then language prefix.
pub fn resolve_strict(language: Language, voices: &[VoiceDescriptor]) -> Option<&VoiceDescriptor> {
    let locale = language.bcp47().to_lowercase();

    voices
        .iter()
        .find(|v| v.normalized_locale() == locale)
        .or_else(|| voices.iter().find(|v| v.language_prefix() == language.code()))
}

/// Resolve a voice, falling back to the first voice in the catalog
pub fn resolve_voice(language: Language, voices: &[VoiceDescriptor]) -> Option<&VoiceDescriptor> {
    resolve_strict(language, voices).or_else(|| voices.first())
}

/// Capability probe: is there a local voice for this language at all?
pub fn has_voice_for(language: Language, voices: &[VoiceDescriptor]) -> bool {
    resolve_strict(language, voices).is_some()
}

/// Return the platform catalog, waiting up to `timeout` if it is still empty.
///
/// Never fails: after the bound the catalog is returned as-is, which may be
/// partial or empty.
pub async fn wait_for_catalog(
    platform: &dyn SpeechPlatform,
    timeout: Duration,
) -> Vec<VoiceDescriptor> {
    let voices = platform.voices();
    if !voices.is_empty() {
        return voices;
    }

    if tokio::time::timeout(timeout, platform.voices_changed())
        .await
        .is_err()
    {
        log::debug!(
            "Voice catalog for {} still empty after {:?}",
            platform.name(),
            timeout
        );
    }

    platform.voices()
}
