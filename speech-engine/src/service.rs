//! HTTP client for the narration backend
//!
//! One base URL serves every collaborator endpoint:
//! - `POST /extract` article extraction
//! - `POST /summarize` LLM summary
//! - `POST /translate` machine translation, `POST /translate_llm` LLM translation
//! - `POST /tts` whole-text speech render (audio bytes)

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::cloud::SpeechRenderer;
use crate::error::{EngineError, Result};
use crate::language::Language;

/// Longest input sent to the summarizer, in characters
pub const MAX_SUMMARY_INPUT: usize = 24_000;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extracted article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    title: Option<String>,
    content: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
    language: &'a str,
}

#[derive(Debug, Deserialize)]
struct SummarizeResponse {
    summary: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    text: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    #[serde(rename = "translatedText", alias = "translated_text")]
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    text: &'a str,
    lang: &'a str,
}

/// Client for the narration backend
#[derive(Debug, Clone)]
pub struct ServiceClient {
    base_url: String,
    client: Client,
}

impl ServiceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Every request fails after `timeout` instead of hanging the caller
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Service {
                message: format!("Failed to build HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch the readable title and body of a web article
    pub async fn extract(&self, url: &str) -> Result<Article> {
        let response = self.post_json("extract", &ExtractRequest { url }).await?;
        let parsed: ExtractResponse = decode(response).await?;

        if let Some(error) = parsed.error {
            return Err(service_error(error, None));
        }

        let content = parsed.content.unwrap_or_default();
        if content.trim().is_empty() {
            return Err(service_error("No article content extracted", None));
        }

        Ok(Article {
            title: parsed.title.unwrap_or_default(),
            content,
        })
    }

    /// Summarize text in the given language
    pub async fn summarize(&self, text: &str, language: Language) -> Result<String> {
        let input = truncate_chars(text, MAX_SUMMARY_INPUT);
        let request = SummarizeRequest {
            text: input,
            language: language.code(),
        };
        let response = self.post_json("summarize", &request).await?;
        let parsed: SummarizeResponse = decode(response).await?;

        let summary = parsed.summary.trim().to_string();
        if summary.is_empty() {
            return Err(service_error("Empty summary returned", None));
        }
        Ok(summary)
    }

    /// Machine translation; `source` is a language code or "auto"
    pub async fn translate(&self, text: &str, target: Language, source: &str) -> Result<String> {
        let request = TranslateRequest {
            text,
            target: target.code(),
            source: Some(source),
        };
        let response = self.post_json("translate", &request).await?;
        let parsed: TranslateResponse = decode(response).await?;
        Ok(parsed.translated_text)
    }

    /// LLM translation
    pub async fn translate_llm(&self, text: &str, target: Language) -> Result<String> {
        let request = TranslateRequest {
            text,
            target: target.code(),
            source: None,
        };
        let response = self.post_json("translate_llm", &request).await?;
        let parsed: TranslateResponse = decode(response).await?;
        Ok(parsed.translated_text)
    }

    async fn post_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| service_error(format!("Request to /{} failed: {}", path, e), None))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(service_error(error_message(&body), Some(status.as_u16())));
        }

        Ok(response)
    }
}

#[async_trait]
impl SpeechRenderer for ServiceClient {
    async fn render(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let request = RenderRequest {
            text,
            lang: language.code(),
        };

        let response = self
            .client
            .post(self.endpoint("tts"))
            .json(&request)
            .send()
            .await
            .map_err(|e| EngineError::RemoteRender {
                message: format!("Request failed: {}", e),
                status_code: None,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::RemoteRender {
                message: error_message(&body),
                status_code: Some(status.as_u16()),
            });
        }

        let bytes = response.bytes().await.map_err(|e| EngineError::RemoteRender {
            message: format!("Failed to read audio: {}", e),
            status_code: None,
        })?;

        Ok(bytes.to_vec())
    }
}

fn service_error(message: impl Into<String>, status_code: Option<u16>) -> EngineError {
    EngineError::Service {
        message: message.into(),
        status_code,
    }
}

async fn decode<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T> {
    response
        .json()
        .await
        .map_err(|e| service_error(format!("Failed to parse response: {}", e), None))
}

/// Pull a readable message out of an error body.
///
/// Understands `{"detail": ...}`, `{"error": "..."}` and
/// `{"error": {"message": ...}}`; anything else is returned as-is.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    let message = value
        .get("detail")
        .or_else(|| value.get("error"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Object(o) => o
                .get("message")
                .and_then(Value::as_str)
                .map(String::from)
                .unwrap_or_else(|| v.to_string()),
            other => other.to_string(),
        });

    message.unwrap_or_else(|| body.trim().to_string())
}

/// Longest prefix of `text` with at most `max` characters
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ServiceClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.endpoint("tts"), "http://localhost:8000/tts");
    }

    #[test]
    fn test_translate_request_shape() {
        let with_source = serde_json::to_value(TranslateRequest {
            text: "Hello",
            target: "ta",
            source: Some("auto"),
        })
        .unwrap();
        assert_eq!(
            with_source,
            serde_json::json!({"text": "Hello", "target": "ta", "source": "auto"})
        );

        let llm = serde_json::to_value(TranslateRequest {
            text: "Hello",
            target: "hi",
            source: None,
        })
        .unwrap();
        assert_eq!(llm, serde_json::json!({"text": "Hello", "target": "hi"}));
    }

    #[test]
    fn test_translate_response_accepts_both_spellings() {
        let camel: TranslateResponse =
            serde_json::from_str(r#"{"translatedText": "வணக்கம்"}"#).unwrap();
        assert_eq!(camel.translated_text, "வணக்கம்");

        let snake: TranslateResponse =
            serde_json::from_str(r#"{"translated_text": "नमस्ते"}"#).unwrap();
        assert_eq!(snake.translated_text, "नमस्ते");
    }

    #[test]
    fn test_render_request_shape() {
        let value = serde_json::to_value(RenderRequest {
            text: "Hi.",
            lang: "en",
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"text": "Hi.", "lang": "en"}));
    }

    #[test]
    fn test_extract_response_with_error() {
        let parsed: ExtractResponse =
            serde_json::from_str(r#"{"error": "Could not fetch URL"}"#).unwrap();
        assert_eq!(parsed.error.as_deref(), Some("Could not fetch URL"));
        assert!(parsed.content.is_none());
    }

    #[test]
    fn test_error_message_formats() {
        assert_eq!(error_message(r#"{"detail": "Empty text"}"#), "Empty text");
        assert_eq!(error_message(r#"{"error": "Bad URL"}"#), "Bad URL");
        assert_eq!(
            error_message(r#"{"error": {"message": "quota exceeded"}}"#),
            "quota exceeded"
        );
        assert_eq!(error_message("Internal Server Error\n"), "Internal Server Error");
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("வணக்கம்", 2), "வண");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
