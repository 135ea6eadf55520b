//! Engine error types

use thiserror::Error;

use crate::language::Language;

/// Errors raised by the playback engine and its service clients
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No matching {language} voice for sentence {index}")]
    VoiceUnavailable { language: Language, index: usize },

    #[error("Speech synthesis failed at sentence {index}: {source}")]
    Synthesis {
        index: usize,
        #[source]
        source: PlatformError,
    },

    #[error("Cloud speech render failed: {message}")]
    RemoteRender {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Text is not written in the {language} script")]
    ScriptMismatch { language: Language },

    #[error("Service request failed: {message}")]
    Service {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Audio playback failed: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by a speech platform while speaking one utterance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("utterance interrupted")]
    Interrupted,

    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// True when the caller should retry through the cloud fallback
    pub fn is_voice_unavailable(&self) -> bool {
        matches!(self, EngineError::VoiceUnavailable { .. })
    }
}
