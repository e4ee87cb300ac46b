//! Contribution store clients
//!
//! The overlay cache reads approved community contributions through the
//! [`ContributionStore`] trait; the gateway writes newly discovered vocabulary
//! back through it. [`RestContributionStore`] talks to a PostgREST-style
//! backend, [`InMemoryContributionStore`] serves tests and offline runs.
//!
//! # Configuration
//!
//! `RestContributionStore::from_env()` reads:
//! - `LEXITIER_STORE_URL` - base REST URL, e.g. `https://project.supabase.co/rest/v1`
//! - `LEXITIER_STORE_KEY` - optional API key sent as `apikey` and bearer token
//! - `LEXITIER_STORE_TABLE` - table name (default `contributions`)

use crate::error::{LexError, LexResult};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// Status value of rows the overlay accepts
pub const APPROVED: &str = "approved";

/// One row of the contributions table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub word: String,
    pub translation: String,
    #[serde(default)]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl ContributionRecord {
    pub fn approved(id: &str, word: &str, translation: &str) -> Self {
        Self {
            id: id.to_string(),
            word: word.to_string(),
            translation: translation.to_string(),
            phonetic: None,
            example: None,
            status: APPROVED.to_string(),
            created_at: None,
        }
    }

    pub fn is_approved(&self) -> bool {
        self.status.eq_ignore_ascii_case(APPROVED)
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Remote source of community contributions
#[async_trait]
pub trait ContributionStore: Send + Sync {
    /// Approved contributions, newest first
    async fn fetch_approved(&self) -> LexResult<Vec<ContributionRecord>>;

    /// Record a gateway-discovered translation for later review
    async fn submit_discovered(&self, word: &str, translation: &str) -> LexResult<()>;

    /// Name used in logs
    fn store_name(&self) -> &str;
}

/// PostgREST-style REST client for the contributions table
#[derive(Clone)]
pub struct RestContributionStore {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    table: String,
}

impl RestContributionStore {
    pub fn new(base_url: String, api_key: Option<String>) -> LexResult<Self> {
        if base_url.trim().is_empty() {
            return Err(LexError::Config("Store URL cannot be empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LexError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            table: "contributions".to_string(),
        })
    }

    pub fn from_env() -> LexResult<Self> {
        let base_url = std::env::var("LEXITIER_STORE_URL").map_err(|_| {
            LexError::Config("LEXITIER_STORE_URL environment variable not set".to_string())
        })?;
        let store = Self::new(base_url, std::env::var("LEXITIER_STORE_KEY").ok())?;
        Ok(match std::env::var("LEXITIER_STORE_TABLE") {
            Ok(table) if !table.trim().is_empty() => store.with_table(table),
            _ => store,
        })
    }

    pub fn with_table(mut self, table: String) -> Self {
        self.table = table;
        self
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url, self.table)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn check(response: reqwest::Response) -> LexResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(LexError::Store(format!("HTTP {}: {}", status, error_text)))
    }
}

impl std::fmt::Debug for RestContributionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestContributionStore")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("table", &self.table)
            .finish()
    }
}

#[async_trait]
impl ContributionStore for RestContributionStore {
    async fn fetch_approved(&self) -> LexResult<Vec<ContributionRecord>> {
        let url = format!(
            "{}?select=*&status=eq.{}&order=created_at.desc",
            self.table_url(),
            APPROVED
        );
        let request = self.client.get(url);
        let response = Self::check(self.authorize(request).send().await?).await?;

        response
            .json::<Vec<ContributionRecord>>()
            .await
            .map_err(|e| LexError::Store(format!("Failed to parse contributions: {}", e)))
    }

    async fn submit_discovered(&self, word: &str, translation: &str) -> LexResult<()> {
        let body = json!({
            "word": word,
            "translation": translation,
            "status": "pending",
            "source": "gateway",
        });
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=minimal")
            .json(&body);
        Self::check(self.authorize(request).send().await?).await?;
        Ok(())
    }

    fn store_name(&self) -> &str {
        "REST contribution store"
    }
}

/// In-process store with switchable failure and simulated latency
#[derive(Debug, Default)]
pub struct InMemoryContributionStore {
    records: Mutex<Vec<ContributionRecord>>,
    submitted: Mutex<Vec<(String, String)>>,
    failing: AtomicBool,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl InMemoryContributionStore {
    pub fn new(records: Vec<ContributionRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Every fetch sleeps for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make subsequent fetches fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_records(&self, records: Vec<ContributionRecord>) {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records;
    }

    /// Number of fetches attempted so far, failed ones included
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<(String, String)> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl ContributionStore for InMemoryContributionStore {
    async fn fetch_approved(&self) -> LexResult<Vec<ContributionRecord>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(LexError::Store("simulated outage".to_string()));
        }

        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        let mut approved: Vec<ContributionRecord> =
            records.iter().filter(|r| r.is_approved()).cloned().collect();
        // stable: rows without timestamps keep insertion order
        approved.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(approved)
    }

    async fn submit_discovered(&self, word: &str, translation: &str) -> LexResult<()> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((word.to_string(), translation.to_string()));
        Ok(())
    }

    fn store_name(&self) -> &str {
        "in-memory contribution store"
    }
}
