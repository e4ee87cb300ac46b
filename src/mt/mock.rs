//! Mock Machine Translator for testing
//!
//! A deterministic, API-free translator for exercising the gateway and the
//! resolver without API keys or network access. It records every text it was
//! asked for so tests can check which tokens reached the oracle.
//!
//! # Example
//!
//! ```ignore
//! use lexitier::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("tôi", "vi", "tyz").await.unwrap();
//!     assert_eq!(result, "tôi_tyz");
//! }
//! ```

use crate::error::{LexError, LexResult};
use crate::mt::translator::MachineTranslator;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "tôi" → "tôi_tyz"
    Suffix,

    /// Predefined text → translation mappings; unknown texts come back unchanged
    Mappings(HashMap<String, String>),

    /// Simulate API errors
    Error(String),

    /// No-op: return input unchanged
    NoOp,
}

impl MockMode {
    /// Convenience constructor for [`MockMode::Mappings`]
    pub fn mappings<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        MockMode::Mappings(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Mock translator that simulates various translation scenarios
#[derive(Debug)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay
    delay: Option<Duration>,
    /// Batch calls fail while single-text calls still work
    fail_batches: bool,
    /// Texts that always fail, in batch or alone
    failing_texts: HashSet<String>,
    requests: Mutex<Vec<String>>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            delay: None,
            fail_batches: false,
            failing_texts: HashSet::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Each call sleeps for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `translate_batch` fail so callers have to fall back to single texts
    pub fn with_failing_batches(mut self) -> Self {
        self.fail_batches = true;
        self
    }

    /// Make every request containing `text` fail
    pub fn with_failing_text(mut self, text: &str) -> Self {
        self.failing_texts.insert(text.to_string());
        self
    }

    /// Every text requested so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn apply_delay(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, texts: &[String]) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend(texts.iter().cloned());
    }

    fn apply_translation(&self, text: &str, target: &str) -> LexResult<String> {
        if self.failing_texts.contains(text) {
            return Err(LexError::Translation(format!("simulated failure for {:?}", text)));
        }

        match &self.mode {
            MockMode::Suffix => Ok(format!("{}_{}", text, target)),
            MockMode::Mappings(map) => Ok(map.get(text).cloned().unwrap_or_else(|| text.to_string())),
            MockMode::Error(msg) => Err(LexError::Translation(msg.clone())),
            MockMode::NoOp => Ok(text.to_string()),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_locale: &str,
        target_locale: &str,
    ) -> LexResult<String> {
        self.record(&[text.to_string()]);
        self.apply_delay().await;
        self.apply_translation(text, target_locale)
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        _source_locale: &str,
        target_locale: &str,
    ) -> LexResult<Vec<String>> {
        self.record(texts);
        // per batch, not per string
        self.apply_delay().await;

        if self.fail_batches {
            return Err(LexError::Translation("simulated batch failure".to_string()));
        }

        texts
            .iter()
            .map(|text| self.apply_translation(text, target_locale))
            .collect()
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
