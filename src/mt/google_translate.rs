//! Google Translate v2 as the gateway's oracle
//!
//! The gateway only ever asks for the residual tokens of one input, already
//! deduplicated, so a request is a short list of single words. Decoding of
//! the response body lives in [`parse_translations`] and [`status_error`] so
//! it can be checked without a network.
//!
//! The key comes from `GOOGLE_TRANSLATE_API_KEY`; `GOOGLE_TRANSLATE_BASE_URL`
//! points the provider at a compatible proxy.

use crate::error::{LexError, LexResult};
use crate::mt::translator::{MachineTranslator, normalize_locale, validate_locale};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://translation.googleapis.com/language/translate/v2";

/// Upper bound on `q` entries the v2 endpoint accepts in one call
const MAX_TOKENS_PER_REQUEST: usize = 128;

#[derive(Clone)]
pub struct GoogleTranslateProvider {
    api_key: String,
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateProvider {
    pub fn new(api_key: String) -> LexResult<Self> {
        if api_key.trim().is_empty() {
            return Err(LexError::Config("API key cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LexError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            api_key,
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn from_env() -> LexResult<Self> {
        let api_key = std::env::var("GOOGLE_TRANSLATE_API_KEY").map_err(|_| {
            LexError::Config("GOOGLE_TRANSLATE_API_KEY environment variable not set".to_string())
        })?;

        let provider = Self::new(api_key)?;
        Ok(match std::env::var("GOOGLE_TRANSLATE_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => provider.with_base_url(url),
            _ => provider,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn request(&self, tokens: &[String], source: &str, target: &str) -> LexResult<Vec<String>> {
        debug!("requesting {} token(s) {} -> {}", tokens.len(), source, target);

        let response = self
            .client
            .post(format!("{}?key={}", self.base_url, self.api_key))
            .json(&json!({
                "q": tokens,
                "source": normalize_locale(source),
                "target": normalize_locale(target),
                "format": "text"
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LexError::Translation(format!("Failed to parse API response: {}", e)))?;
        parse_translations(&body, tokens.len())
    }
}

/// Pull `data.translations[].translatedText` out of a v2 response body
///
/// A body carrying an `error` object, or a translation count that differs
/// from `expected`, is an error.
pub fn parse_translations(body: &Value, expected: usize) -> LexResult<Vec<String>> {
    if let Some(message) = body["error"]["message"].as_str() {
        return Err(LexError::Translation(format!("API error: {}", message)));
    }

    let translations = body["data"]["translations"].as_array().ok_or_else(|| {
        LexError::Translation("Invalid API response: missing 'data.translations' array".to_string())
    })?;
    if translations.len() != expected {
        return Err(LexError::Translation(format!(
            "API returned {} translations for {} tokens",
            translations.len(),
            expected
        )));
    }

    translations
        .iter()
        .map(|t| {
            t["translatedText"]
                .as_str()
                .map(|s| s.trim().to_string())
                .ok_or_else(|| {
                    LexError::Translation(
                        "Invalid API response: missing 'translatedText' field".to_string(),
                    )
                })
        })
        .collect()
}

/// Map a non-success status to an error
///
/// 4xx means the request or the key is wrong (`Config`); anything else is the
/// service failing (`Translation`). Google's JSON error message is preferred
/// over the raw body when present.
pub fn status_error(status: StatusCode, body: &str) -> LexError {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());

    if status.is_client_error() {
        LexError::Config(format!("API client error ({}): {}", status, detail))
    } else {
        LexError::Translation(format!("API server error ({}): {}", status, detail))
    }
}

impl std::fmt::Debug for GoogleTranslateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleTranslateProvider")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for GoogleTranslateProvider {
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> LexResult<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        let mut results = self
            .translate_batch(&[text.to_string()], source_locale, target_locale)
            .await?;
        Ok(results.pop().unwrap_or_default())
    }

    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> LexResult<Vec<String>> {
        validate_locale(source_locale)?;
        validate_locale(target_locale)?;

        let mut results = Vec::with_capacity(texts.len());
        for tokens in texts.chunks(MAX_TOKENS_PER_REQUEST) {
            results.extend(self.request(tokens, source_locale, target_locale).await?);
        }
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
