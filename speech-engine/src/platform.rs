//! Speech platform trait and request types

use async_trait::async_trait;

use crate::error::PlatformError;
use crate::voice::VoiceDescriptor;

/// Everything the platform needs to speak one utterance
#[derive(Debug, Clone)]
pub struct SpeakRequest {
    /// Trimmed, non-empty sentence text
    pub text: String,
    /// BCP-47 locale of the text (e.g., "hi-IN")
    pub locale: String,
    /// Voice chosen for the session
    pub voice: VoiceDescriptor,
}

/// Local speech synthesis backend - all platforms implement this
#[async_trait]
pub trait SpeechPlatform: Send + Sync {
    /// Snapshot of the voices currently known to the platform.
    ///
    /// May be empty until the platform has finished loading its catalog.
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Resolves the next time the voice catalog changes
    async fn voices_changed(&self);

    /// Speak one utterance, resolving when the platform reports completion
    async fn speak(&self, request: &SpeakRequest) -> Result<(), PlatformError>;

    /// Cancel any utterance in flight. Must be safe to call when idle.
    fn cancel(&self);

    /// Backend name
    fn name(&self) -> &str;
}
