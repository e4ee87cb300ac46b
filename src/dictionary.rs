//! Dictionary entries, the static phrase dictionary and the merged lookup view
//!
//! A [`StaticDictionary`] is built once at startup and never mutated. At
//! resolution time it is combined with the current overlay snapshot into a
//! [`MergedDictionary`]; both implement [`Lexicon`], which is all the matcher
//! and the inference engine need.

use crate::error::{LexError, LexResult};
use crate::text::normalize;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Where an entry came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    /// Hand-curated dictionary shipped with the application
    Static,
    /// Approved community contribution from the overlay
    Contribution { contribution_id: String },
    /// Returned by the external translation gateway for this resolution
    Gateway { provider: String },
}

/// One source phrase and its target-script renderings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Normalized source phrase
    pub key: String,
    /// Alternate renderings in the target script, in source order
    pub script_variants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub provenance: Provenance,
}

impl DictionaryEntry {
    /// Build an entry from a raw `/`-separated script value
    ///
    /// `"pây noòn/pay nòn"` yields two variants. Fails if the phrase normalizes
    /// to nothing or any variant is empty.
    pub fn new(phrase: &str, script: &str) -> LexResult<Self> {
        let variants = script.split('/').map(str::to_string).collect();
        Self::from_variants(phrase, variants)
    }

    /// Build an entry from already-split variants
    pub fn from_variants(phrase: &str, variants: Vec<String>) -> LexResult<Self> {
        let key = normalize(phrase);
        if key.is_empty() {
            return Err(LexError::InvalidEntry(format!(
                "phrase {:?} has no tokens",
                phrase
            )));
        }

        let mut script_variants = Vec::with_capacity(variants.len());
        for variant in variants {
            let variant = variant.split_whitespace().collect::<Vec<_>>().join(" ");
            if variant.is_empty() {
                return Err(LexError::InvalidEntry(format!(
                    "phrase {:?} has an empty script variant",
                    key
                )));
            }
            script_variants.push(variant);
        }
        if script_variants.is_empty() {
            return Err(LexError::InvalidEntry(format!(
                "phrase {:?} has no script variants",
                key
            )));
        }

        Ok(Self {
            key,
            script_variants,
            phonetic: None,
            notes: None,
            provenance: Provenance::Static,
        })
    }

    pub fn with_phonetic(mut self, phonetic: Option<String>) -> Self {
        self.phonetic = phonetic.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes.filter(|n| !n.trim().is_empty());
        self
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
        self
    }

    /// Source tokens of the key
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.key.split(' ')
    }

    pub fn token_count(&self) -> usize {
        self.tokens().count()
    }

    /// First variant, the one shown when only one rendering fits
    pub fn primary_script(&self) -> &str {
        &self.script_variants[0]
    }

    /// All variants joined back into the stored `/` form
    pub fn script(&self) -> String {
        self.script_variants.join("/")
    }

    /// Whether any variant contains `token` as one of its words (case-insensitive)
    pub fn has_script_token(&self, token: &str) -> bool {
        let token = token.to_lowercase();
        self.script_variants
            .iter()
            .any(|v| v.split_whitespace().any(|t| t.to_lowercase() == token))
    }
}

/// Read access shared by the static dictionary and the merged view
pub trait Lexicon {
    /// Entry for an already-normalized key
    fn get(&self, key: &str) -> Option<&DictionaryEntry>;

    /// All entries in ascending key order, one per key
    fn entries(&self) -> impl Iterator<Item = &DictionaryEntry>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalizes `phrase` before looking it up
    fn lookup(&self, phrase: &str) -> Option<&DictionaryEntry> {
        self.get(&normalize(phrase))
    }
}

/// Immutable hand-curated phrase dictionary
#[derive(Debug, Clone, Default)]
pub struct StaticDictionary {
    entries: BTreeMap<String, DictionaryEntry>,
}

impl StaticDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(phrase, script)` pairs, failing on the first malformed or duplicate entry
    pub fn from_pairs<'a, I>(pairs: I) -> LexResult<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut dictionary = Self::new();
        for (phrase, script) in pairs {
            dictionary.insert(DictionaryEntry::new(phrase, script)?)?;
        }
        Ok(dictionary)
    }

    /// Add an entry; duplicate keys are a configuration error
    pub fn insert(&mut self, entry: DictionaryEntry) -> LexResult<()> {
        if self.entries.contains_key(&entry.key) {
            return Err(LexError::InvalidEntry(format!(
                "duplicate phrase {:?}",
                entry.key
            )));
        }
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

impl Lexicon for StaticDictionary {
    fn get(&self, key: &str) -> Option<&DictionaryEntry> {
        self.entries.get(key)
    }

    fn entries(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.values()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Static dictionary plus an overlay snapshot
///
/// Overlay entries only fill keys the static dictionary lacks; on a collision
/// the curated entry is the one returned.
#[derive(Debug)]
pub struct MergedDictionary<'a> {
    entries: BTreeMap<&'a str, &'a DictionaryEntry>,
}

impl<'a> MergedDictionary<'a> {
    pub fn new(base: &'a StaticDictionary, overlay: &'a HashMap<String, DictionaryEntry>) -> Self {
        let mut entries: BTreeMap<&'a str, &'a DictionaryEntry> = base
            .entries
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect();
        for (key, entry) in overlay {
            entries.entry(key.as_str()).or_insert(entry);
        }
        Self { entries }
    }
}

impl Lexicon for MergedDictionary<'_> {
    fn get(&self, key: &str) -> Option<&DictionaryEntry> {
        self.entries.get(key).copied()
    }

    fn entries(&self) -> impl Iterator<Item = &DictionaryEntry> {
        self.entries.values().copied()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
