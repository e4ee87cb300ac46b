//! Greedy longest-first phrase segmentation
//!
//! Keys are tried from the longest token count down; among keys of equal
//! length the smaller key (byte order) is tried first. A key matches where its
//! tokens occur contiguously in the input and none of those positions has been
//! consumed by an earlier (longer or equal-length, smaller-key) match. Every
//! occurrence is consumed, so `"đi"` is never reported inside `"đi ngủ"`.

use crate::dictionary::{DictionaryEntry, Lexicon};
use crate::text::tokenize;
use std::collections::{BTreeSet, HashSet};

/// One dictionary phrase found in the input
#[derive(Debug, Clone, PartialEq)]
pub struct PhraseMatch<'a> {
    pub entry: &'a DictionaryEntry,
    /// Token index of the first occurrence
    pub start: usize,
    /// Number of tokens covered by one occurrence
    pub len: usize,
}

impl PhraseMatch<'_> {
    pub fn phrase(&self) -> &str {
        &self.entry.key
    }
}

/// Matches in input order and every token position they cover
#[derive(Debug, Clone, Default)]
pub struct PhraseMatches<'a> {
    pub matches: Vec<PhraseMatch<'a>>,
    pub consumed: BTreeSet<usize>,
}

/// Tokenize `text` and match it against `dictionary`
pub fn match_phrases<'a, L: Lexicon>(text: &str, dictionary: &'a L) -> PhraseMatches<'a> {
    match_tokens(&tokenize(text), dictionary)
}

/// Match already-normalized tokens against `dictionary`
pub fn match_tokens<'a, L: Lexicon>(tokens: &[String], dictionary: &'a L) -> PhraseMatches<'a> {
    let mut result = PhraseMatches::default();
    if tokens.is_empty() {
        return result;
    }

    let present: HashSet<&str> = tokens.iter().map(String::as_str).collect();

    // entries() is in key order, so a stable sort keeps key order within a length
    let mut candidates: Vec<(Vec<&str>, &'a DictionaryEntry)> = dictionary
        .entries()
        .map(|entry| (entry.tokens().collect::<Vec<_>>(), entry))
        .filter(|(phrase, _)| phrase.len() <= tokens.len() && present.contains(phrase[0]))
        .collect();
    candidates.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    for (phrase, entry) in candidates {
        let len = phrase.len();
        let mut first = None;
        for start in 0..=(tokens.len() - len) {
            let span = start..start + len;
            if span.clone().any(|pos| result.consumed.contains(&pos)) {
                continue;
            }
            if tokens[span.clone()]
                .iter()
                .zip(&phrase)
                .all(|(token, key)| token == key)
            {
                result.consumed.extend(span);
                first.get_or_insert(start);
            }
        }
        if let Some(start) = first {
            result.matches.push(PhraseMatch { entry, start, len });
        }
    }

    result.matches.sort_by_key(|m| m.start);
    result
}
