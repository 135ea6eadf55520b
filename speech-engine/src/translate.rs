//! Translation strategy chain
//!
//! Strategies are tried in order. A strategy's output is only accepted when
//! it is non-empty and written in the target language's script; otherwise
//! the next one is tried. When every strategy fails the original text is
//! returned, so translation never blocks playback.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::language::Language;
use crate::service::ServiceClient;

/// One way of translating text
#[async_trait]
pub trait TranslationStrategy: Send + Sync {
    async fn translate(&self, text: &str, target: Language) -> Result<String>;

    fn name(&self) -> &str;
}

/// Machine translation providers behind the `/translate` endpoint
pub struct ProviderTranslation {
    client: Arc<ServiceClient>,
}

impl ProviderTranslation {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranslationStrategy for ProviderTranslation {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        self.client.translate(text, target, "auto").await
    }

    fn name(&self) -> &str {
        "provider"
    }
}

/// LLM translation behind the `/translate_llm` endpoint
pub struct LlmTranslation {
    client: Arc<ServiceClient>,
}

impl LlmTranslation {
    pub fn new(client: Arc<ServiceClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TranslationStrategy for LlmTranslation {
    async fn translate(&self, text: &str, target: Language) -> Result<String> {
        self.client.translate_llm(text, target).await
    }

    fn name(&self) -> &str {
        "llm"
    }
}

/// Ordered chain of translation strategies
pub struct Translator {
    chain: Vec<Arc<dyn TranslationStrategy>>,
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field(
                "chain",
                &self.chain.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Translator {
    pub fn new(chain: Vec<Arc<dyn TranslationStrategy>>) -> Self {
        Self { chain }
    }

    /// Provider first, LLM second, both through the same service
    pub fn for_service(client: Arc<ServiceClient>) -> Self {
        Self::new(vec![
            Arc::new(ProviderTranslation::new(Arc::clone(&client))),
            Arc::new(LlmTranslation::new(client)),
        ])
    }

    /// Translate `text` into `target`, falling back to the original text
    pub async fn translate(&self, text: &str, target: Language) -> String {
        if target == Language::En || text.trim().is_empty() {
            return text.to_string();
        }

        for strategy in &self.chain {
            match strategy.translate(text, target).await {
                Ok(out) if out.trim().is_empty() => {
                    log::warn!("Translation via {} returned nothing", strategy.name());
                }
                Ok(out) if !target.matches_script(&out) => {
                    log::warn!(
                        "Translation via {} is not in {} script",
                        strategy.name(),
                        target
                    );
                }
                Ok(out) => {
                    log::debug!("Translated to {} via {}", target, strategy.name());
                    return out;
                }
                Err(e) => {
                    log::warn!("Translation via {} failed: {}", strategy.name(), e);
                }
            }
        }

        log::warn!("All translation strategies failed, keeping original text");
        text.to_string()
    }
}
