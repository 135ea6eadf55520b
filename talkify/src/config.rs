// talkify configuration management

use anyhow::Result;
use serde::{Deserialize, Serialize};
use speech_engine::Language;
use speech_engine::summarize::DEFAULT_SUMMARY_SENTENCES;
use std::fs;
use std::path::PathBuf;

const DEFAULT_SERVICE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_PLAYER: &str = "afplay";
const DEFAULT_RATE: u32 = 175;
const DEFAULT_VOICE_WAIT_MS: u64 = 900;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TalkifyConfig {
    /// Base URL of the extraction/summary/translation/TTS backend
    #[serde(default = "default_service_url")]
    pub service_url: String,

    /// Narration language
    #[serde(default)]
    pub language: Language,

    /// Local speaking rate in words per minute
    #[serde(default = "default_rate")]
    pub rate: u32,

    /// Command used to play cloud-rendered audio files
    #[serde(default = "default_player")]
    pub player: String,

    /// How long to wait for the local voice catalog to load
    #[serde(default = "default_voice_wait_ms")]
    pub voice_wait_ms: u64,

    /// Timeout for each backend request
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Sentences kept when the summary falls back to the offline summarizer
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_player() -> String {
    DEFAULT_PLAYER.to_string()
}

fn default_rate() -> u32 {
    DEFAULT_RATE
}

fn default_voice_wait_ms() -> u64 {
    DEFAULT_VOICE_WAIT_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_summary_sentences() -> usize {
    DEFAULT_SUMMARY_SENTENCES
}

impl Default for TalkifyConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
            language: Language::default(),
            rate: default_rate(),
            player: default_player(),
            voice_wait_ms: default_voice_wait_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            summary_sentences: default_summary_sentences(),
        }
    }
}

impl TalkifyConfig {
    /// Get the config file path: ~/.config/cli-programs/talkify.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("cli-programs")
            .join("talkify.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: TalkifyConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }
}
