//! Narration languages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::script::Script;

/// Narration languages supported end to end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ta,
    Hi,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ta, Language::Hi];

    /// Short code used by the remote services
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ta => "ta",
            Language::Hi => "hi",
        }
    }

    /// Locale handed to the synthesizer and used for exact voice matching
    pub fn bcp47(self) -> &'static str {
        match self {
            Language::En => "en-US",
            Language::Ta => "ta-IN",
            Language::Hi => "hi-IN",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Ta => "Tamil",
            Language::Hi => "Hindi",
        }
    }

    /// Writing system that translated text must use, if any
    pub fn script(self) -> Option<Script> {
        match self {
            Language::En => None,
            Language::Ta => Some(Script::Tamil),
            Language::Hi => Some(Script::Devanagari),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts a short code ("ta") or a locale tag ("ta-IN", "ta_IN")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-").to_lowercase();
        let primary = normalized.split('-').next().unwrap_or_default();

        Language::ALL
            .into_iter()
            .find(|language| language.code() == primary)
            .ok_or_else(|| {
                let available: Vec<&str> = Language::ALL.iter().map(|l| l.code()).collect();
                format!(
                    "Unsupported language: {}. Available: {}",
                    s,
                    available.join(", ")
                )
            })
    }
}
