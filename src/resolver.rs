//! Tiered resolution of an input text
//!
//! Tiers run in a fixed order and each only sees what the previous one left:
//!
//! 1. phrase matching against the static dictionary merged with the overlay
//! 2. word inference for tokens no phrase covered
//! 3. the translation gateway, for the residual tokens only
//!
//! Gateway results are written back through the gateway on a detached task.
//! Network failures in the overlay or the gateway degrade the result instead
//! of failing it.

use crate::config::ResolverConfig;
use crate::dictionary::{DictionaryEntry, Lexicon, MergedDictionary, Provenance, StaticDictionary};
use crate::error::{LexError, LexResult};
use crate::inference::{InferredWord, infer};
use crate::matcher::match_tokens;
use crate::mt::gateway::{TranslationGateway, missing_gateway};
use crate::overlay::{OverlayCache, OverlaySnapshot};
use crate::text::{normalize, tokenize};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A phrase or word resolved from a dictionary, the overlay or the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectMatch {
    pub word: String,
    pub entry: DictionaryEntry,
    /// Token index of the first occurrence in the input
    pub position: usize,
}

/// Outcome of resolving one input text
///
/// Every token of the input lands in exactly one of the three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub direct_matches: Vec<DirectMatch>,
    pub inferred_matches: Vec<InferredWord>,
    pub unresolved: Vec<String>,
}

impl ResolutionResult {
    pub fn is_fully_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

pub struct Resolver {
    dictionary: Arc<StaticDictionary>,
    overlay: Option<Arc<OverlayCache>>,
    gateway: Option<Arc<dyn TranslationGateway>>,
    gateway_timeout: Duration,
}

impl Resolver {
    pub fn new(dictionary: Arc<StaticDictionary>) -> Self {
        Self {
            dictionary,
            overlay: None,
            gateway: None,
            gateway_timeout: ResolverConfig::default().gateway_timeout,
        }
    }

    pub fn with_overlay(mut self, overlay: Arc<OverlayCache>) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_gateway(mut self, gateway: Arc<dyn TranslationGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    pub fn with_config(self, config: &ResolverConfig) -> Self {
        self.with_gateway_timeout(config.gateway_timeout)
    }

    pub fn dictionary(&self) -> &StaticDictionary {
        &self.dictionary
    }

    pub fn overlay(&self) -> Option<&Arc<OverlayCache>> {
        self.overlay.as_ref()
    }

    /// Current overlay snapshot, empty when no overlay is configured
    pub async fn overlay_snapshot(&self) -> OverlaySnapshot {
        match &self.overlay {
            Some(cache) => cache.get().await,
            None => OverlaySnapshot::default(),
        }
    }

    /// Direct entry for a word or phrase from the dictionary or the overlay
    pub async fn lookup(&self, phrase: &str) -> Option<DictionaryEntry> {
        let overlay = self.overlay_snapshot().await;
        let merged = MergedDictionary::new(&self.dictionary, &overlay);
        merged.lookup(phrase).cloned()
    }

    /// Run the matching and inference tiers only, without any network call
    pub fn resolve_local(
        &self,
        text: &str,
        overlay: &HashMap<String, DictionaryEntry>,
    ) -> ResolutionResult {
        self.resolve_tokens(&tokenize(text), overlay)
    }

    /// Resolve `text` through all tiers
    ///
    /// Always returns a result; overlay and gateway failures leave the
    /// affected tokens in `unresolved`.
    pub async fn resolve(&self, text: &str) -> ResolutionResult {
        let tokens = tokenize(text);
        let overlay = self.overlay_snapshot().await;
        let mut result = self.resolve_tokens(&tokens, &overlay);

        let Some(gateway) = &self.gateway else {
            return result;
        };
        if result.unresolved.is_empty() {
            return result;
        }

        let translations = match tokio::time::timeout(
            self.gateway_timeout,
            gateway.translate_missing(&result.unresolved),
        )
        .await
        {
            Ok(Ok(translations)) => translations,
            Ok(Err(e)) => {
                warn!(
                    "{} failed for {} token(s), leaving them unresolved: {}",
                    gateway.gateway_name(),
                    result.unresolved.len(),
                    e
                );
                return result;
            }
            Err(_) => {
                warn!(
                    "{} timed out after {:?}, leaving {} token(s) unresolved",
                    gateway.gateway_name(),
                    self.gateway_timeout,
                    result.unresolved.len()
                );
                return result;
            }
        };

        let discovered = absorb_translations(
            &mut result,
            &tokens,
            translations,
            gateway.gateway_name(),
        );
        if !discovered.is_empty() {
            persist_discovered(Arc::clone(gateway), discovered);
        }
        result
    }

    /// Send `tokens` straight to the gateway, bypassing the local tiers
    pub async fn translate_missing(&self, tokens: &[String]) -> LexResult<HashMap<String, String>> {
        let gateway = self.gateway.as_ref().ok_or_else(missing_gateway)?;
        tokio::time::timeout(self.gateway_timeout, gateway.translate_missing(tokens))
            .await
            .map_err(|_| {
                LexError::Timeout(format!(
                    "{} did not answer within {:?}",
                    gateway.gateway_name(),
                    self.gateway_timeout
                ))
            })?
    }

    fn resolve_tokens(
        &self,
        tokens: &[String],
        overlay: &HashMap<String, DictionaryEntry>,
    ) -> ResolutionResult {
        let merged = MergedDictionary::new(&self.dictionary, overlay);
        let phrases = match_tokens(tokens, &merged);

        let direct_matches: Vec<DirectMatch> = phrases
            .matches
            .iter()
            .map(|m| DirectMatch {
                word: m.phrase().to_string(),
                entry: m.entry.clone(),
                position: m.start,
            })
            .collect();

        let mut seen = HashSet::new();
        let remaining = tokens
            .iter()
            .enumerate()
            .filter(|(pos, _)| !phrases.consumed.contains(pos))
            .map(|(_, token)| token)
            .filter(|token| seen.insert(token.as_str()));

        let mut inferred_matches = Vec::new();
        let mut unresolved = Vec::new();
        for token in remaining {
            match infer(token, &merged) {
                Some(inferred) => inferred_matches.push(inferred),
                None => unresolved.push(token.clone()),
            }
        }

        debug!(
            "resolved {} token(s): {} direct, {} inferred, {} unresolved",
            tokens.len(),
            direct_matches.len(),
            inferred_matches.len(),
            unresolved.len()
        );

        ResolutionResult {
            direct_matches,
            inferred_matches,
            unresolved,
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("dictionary_entries", &self.dictionary.len())
            .field("overlay", &self.overlay)
            .field("gateway", &self.gateway.as_ref().map(|g| g.gateway_name().to_string()))
            .field("gateway_timeout", &self.gateway_timeout)
            .finish()
    }
}

/// Move gateway-translated tokens from `unresolved` into `direct_matches`
///
/// Returns the pairs that were accepted, for write-back.
fn absorb_translations(
    result: &mut ResolutionResult,
    tokens: &[String],
    translations: HashMap<String, String>,
    provider: &str,
) -> Vec<(String, String)> {
    let mut discovered = Vec::new();
    let mut still_unresolved = Vec::new();

    for token in std::mem::take(&mut result.unresolved) {
        let entry = translations
            .get(&token)
            .and_then(|translation| match DictionaryEntry::new(&token, translation) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("discarding gateway output for {:?}: {}", token, e);
                    None
                }
            });

        match entry {
            Some(entry) => {
                discovered.push((token.clone(), entry.script()));
                let position = tokens.iter().position(|t| *t == token).unwrap_or(0);
                result.direct_matches.push(DirectMatch {
                    word: normalize(&token),
                    entry: entry.with_provenance(Provenance::Gateway {
                        provider: provider.to_string(),
                    }),
                    position,
                });
            }
            None => still_unresolved.push(token),
        }
    }

    result.direct_matches.sort_by_key(|m| m.position);
    result.unresolved = still_unresolved;
    discovered
}

/// Fire-and-forget write-back of gateway discoveries
fn persist_discovered(gateway: Arc<dyn TranslationGateway>, discovered: Vec<(String, String)>) {
    tokio::spawn(async move {
        for (token, translation) in discovered {
            if let Err(e) = gateway.save_discovered(&token, &translation).await {
                warn!("failed to save discovered translation for {:?}: {}", token, e);
            }
        }
    });
}
