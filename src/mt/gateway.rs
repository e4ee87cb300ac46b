//! Translation gateway used for the residual set of unresolved tokens
//!
//! The resolver only ever hands the gateway tokens that neither the
//! dictionaries nor inference could resolve. A gateway must tolerate partial
//! failure: whatever it managed to translate comes back, the rest is simply
//! absent from the returned map.

use crate::error::{LexError, LexResult};
use crate::mt::store::ContributionStore;
use crate::mt::translator::{MachineTranslator, validate_locale};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// External oracle for tokens the local knowledge cannot resolve
#[async_trait]
pub trait TranslationGateway: Send + Sync {
    /// Translate as many of `tokens` as possible
    ///
    /// Tokens missing from the returned map stay unresolved. An `Err` means
    /// nothing could be translated at all.
    async fn translate_missing(&self, tokens: &[String]) -> LexResult<HashMap<String, String>>;

    /// Persist a discovered translation so future resolutions can use it
    async fn save_discovered(&self, token: &str, translation: &str) -> LexResult<()>;

    /// Name recorded as the provenance of gateway results
    fn gateway_name(&self) -> &str;
}

/// Gateway backed by a [`MachineTranslator`], optionally writing discoveries to a store
pub struct TranslatorGateway {
    translator: Arc<dyn MachineTranslator>,
    store: Option<Arc<dyn ContributionStore>>,
    source_locale: String,
    target_locale: String,
}

impl TranslatorGateway {
    pub fn new(
        translator: Arc<dyn MachineTranslator>,
        source_locale: &str,
        target_locale: &str,
    ) -> LexResult<Self> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        Ok(Self {
            translator,
            store: None,
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
        })
    }

    /// Send discovered translations to `store` as pending contributions
    pub fn with_store(mut self, store: Arc<dyn ContributionStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// One text at a time, used when the batch call fails as a whole
    async fn translate_individually(
        &self,
        tokens: &[String],
    ) -> LexResult<HashMap<String, String>> {
        let mut translated = HashMap::new();
        let mut last_error = None;

        for token in tokens {
            match self
                .translator
                .translate(token, &self.source_locale, &self.target_locale)
                .await
            {
                Ok(output) => {
                    if let Some(output) = accept(token, &output) {
                        translated.insert(token.clone(), output);
                    }
                }
                Err(e) => {
                    debug!("{} failed for {:?}: {}", self.translator.provider_name(), token, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if translated.is_empty() => Err(e),
            _ => Ok(translated),
        }
    }
}

impl std::fmt::Debug for TranslatorGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslatorGateway")
            .field("translator", &self.translator.provider_name())
            .field("store", &self.store.as_ref().map(|s| s.store_name().to_string()))
            .field("source_locale", &self.source_locale)
            .field("target_locale", &self.target_locale)
            .finish()
    }
}

/// Drop empty outputs and outputs that just echo the input
fn accept(token: &str, output: &str) -> Option<String> {
    let output = output.trim();
    if output.is_empty() || output.to_lowercase() == token.to_lowercase() {
        None
    } else {
        Some(output.to_string())
    }
}

#[async_trait]
impl TranslationGateway for TranslatorGateway {
    async fn translate_missing(&self, tokens: &[String]) -> LexResult<HashMap<String, String>> {
        if tokens.is_empty() {
            return Ok(HashMap::new());
        }

        match self
            .translator
            .translate_batch(tokens, &self.source_locale, &self.target_locale)
            .await
        {
            Ok(outputs) if outputs.len() == tokens.len() => Ok(tokens
                .iter()
                .zip(outputs)
                .filter_map(|(token, output)| accept(token, &output).map(|o| (token.clone(), o)))
                .collect()),
            Ok(outputs) => {
                warn!(
                    "{} returned {} results for {} tokens, retrying one by one",
                    self.translator.provider_name(),
                    outputs.len(),
                    tokens.len()
                );
                self.translate_individually(tokens).await
            }
            Err(e) => {
                warn!(
                    "{} batch failed ({}), retrying one by one",
                    self.translator.provider_name(),
                    e
                );
                self.translate_individually(tokens).await
            }
        }
    }

    async fn save_discovered(&self, token: &str, translation: &str) -> LexResult<()> {
        match &self.store {
            Some(store) => store.submit_discovered(token, translation).await,
            None => Ok(()),
        }
    }

    fn gateway_name(&self) -> &str {
        self.translator.provider_name()
    }
}

/// Error for callers that need a gateway but were not given one
pub fn missing_gateway() -> LexError {
    LexError::Config("no translation gateway configured".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use crate::mt::store::InMemoryContributionStore;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn gateway(mock: MockTranslator) -> TranslatorGateway {
        TranslatorGateway::new(Arc::new(mock), "vi", "tyz").unwrap()
    }

    #[test]
    fn test_new_rejects_bad_locale() {
        let mock = Arc::new(MockTranslator::new(MockMode::NoOp));
        assert!(matches!(
            TranslatorGateway::new(mock, "vi", "bad@locale"),
            Err(LexError::InvalidLocale(_))
        ));
    }

    #[tokio::test]
    async fn test_batch_translation() {
        let gw = gateway(MockTranslator::new(MockMode::mappings([
            ("tôi", "kù"),
            ("nhà", "rườn"),
        ])));
        let result = gw.translate_missing(&tokens(&["tôi", "nhà"])).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result["tôi"], "kù");
        assert_eq!(result["nhà"], "rườn");
    }

    #[tokio::test]
    async fn test_echoed_tokens_are_dropped() {
        let gw = gateway(MockTranslator::new(MockMode::mappings([("tôi", "kù")])));
        let result = gw.translate_missing(&tokens(&["tôi", "xyz"])).await.unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result.contains_key("xyz"));
    }

    #[tokio::test]
    async fn test_partial_failure_falls_back_to_single_texts() {
        let mock = MockTranslator::new(MockMode::Suffix)
            .with_failing_batches()
            .with_failing_text("nhà");
        let gw = gateway(mock);
        let result = gw.translate_missing(&tokens(&["tôi", "nhà"])).await.unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result["tôi"], "tôi_tyz");
    }

    #[tokio::test]
    async fn test_total_failure_is_an_error() {
        let gw = gateway(MockTranslator::new(MockMode::Error("down".to_string())));
        assert!(gw.translate_missing(&tokens(&["tôi"])).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_input_skips_translator() {
        let mock = Arc::new(MockTranslator::new(MockMode::Suffix));
        let gw = TranslatorGateway::new(mock.clone(), "vi", "tyz").unwrap();
        assert!(gw.translate_missing(&[]).await.unwrap().is_empty());
        assert!(mock.requested().is_empty());
    }

    #[tokio::test]
    async fn test_save_discovered_writes_to_store() {
        let store = Arc::new(InMemoryContributionStore::new(vec![]));
        let gw = gateway(MockTranslator::new(MockMode::Suffix)).with_store(store.clone());
        gw.save_discovered("tôi", "kù").await.unwrap();
        assert_eq!(store.submitted(), vec![("tôi".to_string(), "kù".to_string())]);
    }

    #[tokio::test]
    async fn test_save_discovered_without_store_is_noop() {
        let gw = gateway(MockTranslator::new(MockMode::Suffix));
        assert!(gw.save_discovered("tôi", "kù").await.is_ok());
        assert_eq!(gw.gateway_name(), "Mock Translator");
    }
}
