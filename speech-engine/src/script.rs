//! Writing-system checks for translated text

use crate::language::Language;

/// Unicode blocks a target language is expected to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Script {
    /// U+0B80..U+0BFF
    Tamil,
    /// U+0900..U+097F
    Devanagari,
}

impl Script {
    pub fn contains(self, ch: char) -> bool {
        match self {
            Script::Tamil => ('\u{0B80}'..='\u{0BFF}').contains(&ch),
            Script::Devanagari => ('\u{0900}'..='\u{097F}').contains(&ch),
        }
    }

    /// True if at least one character of `text` belongs to this script
    pub fn appears_in(self, text: &str) -> bool {
        text.chars().any(|ch| self.contains(ch))
    }
}

impl Language {
    /// Whether `text` is plausibly written in this language's script
    pub fn matches_script(self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self.script() {
            Some(script) => script.appears_in(text),
            None => true,
        }
    }
}

/// Check text against the script of a language tag.
///
/// Tags are matched on their primary subtag, so "ta" and "ta-IN" both
/// require Tamil characters. Unrecognized tags carry no constraint.
/// Empty text never passes.
pub fn has_target_script(text: &str, tag: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    match tag.parse::<Language>() {
        Ok(language) => language.matches_script(text),
        Err(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tamil_text() {
        assert!(has_target_script("வணக்கம்", "ta"));
        assert!(!has_target_script("Hello", "ta"));
    }

    #[test]
    fn test_hindi_text() {
        assert!(has_target_script("नमस्ते दुनिया", "hi"));
        assert!(has_target_script("Breaking: नमस्ते", "hi-IN"));
        assert!(!has_target_script("வணக்கம்", "hi"));
    }

    #[test]
    fn test_english_and_unknown_tags_always_pass() {
        assert!(has_target_script("anything at all", "en"));
        assert!(has_target_script("வணக்கம்", "en"));
        assert!(has_target_script("bonjour", "fr"));
    }

    #[test]
    fn test_empty_text_never_passes() {
        assert!(!has_target_script("", "ta"));
        assert!(!has_target_script("", "hi"));
        assert!(!has_target_script("", "en"));
    }

    #[test]
    fn test_language_script_mapping() {
        assert_eq!(Language::Ta.script(), Some(Script::Tamil));
        assert_eq!(Language::Hi.script(), Some(Script::Devanagari));
        assert_eq!(Language::En.script(), None);
    }
}
