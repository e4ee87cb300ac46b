//! Word inference from multi-word dictionary entries
//!
//! A word with no entry of its own often appears inside phrases that do have
//! one. When a phrase and one of its script variants have the same number of
//! tokens, the variant token at the word's position is a candidate rendering.
//! Candidates are grouped across all phrases and variants; the one backed by
//! the most distinct phrases wins, and that count alone sets the confidence.
//!
//! Each candidate also carries a corroboration score: how many of the other
//! positions in its phrase are confirmed by the dictionary entry of the token
//! at that position. It only breaks ties between equally supported
//! candidates.
//!
//! Phrases are walked in ascending key order, so the result is a pure function
//! of the dictionary contents. Remaining ties go to the candidate seen first.

use crate::dictionary::Lexicon;
use crate::text::{normalize, script_tokens};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// How strongly the dictionary supports an inferred rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// Map the number of distinct supporting phrases to a confidence level
    pub fn from_support(phrases: usize) -> Self {
        match phrases {
            n if n >= 3 => Confidence::High,
            2 => Confidence::Medium,
            _ => Confidence::Low,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        };
        f.write_str(label)
    }
}

/// One phrase/variant pair that produced the winning candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub phrase: String,
    pub variant: String,
    /// Zero-based token index of the inferred word inside the phrase
    pub position: usize,
    /// Other positions of the phrase confirmed by their own entries
    pub corroboration: usize,
}

/// Hypothesis for a word that has no entry of its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredWord {
    pub word: String,
    pub script: String,
    pub confidence: Confidence,
    /// Distinct phrases behind `script`
    pub supporting_phrases: usize,
    pub evidence: Vec<Evidence>,
    pub reasoning: String,
}

#[derive(Debug)]
struct Candidate {
    script: String,
    /// Supporting phrase with its best corroboration across variants
    phrases: Vec<(String, usize)>,
    evidence: Vec<Evidence>,
}

impl Candidate {
    fn support(&mut self, phrase: &str, corroboration: usize) {
        match self.phrases.iter_mut().find(|(p, _)| p.as_str() == phrase) {
            Some((_, best)) => *best = (*best).max(corroboration),
            None => self.phrases.push((phrase.to_string(), corroboration)),
        }
    }

    fn corroboration(&self) -> usize {
        self.phrases.iter().map(|(_, c)| c).sum()
    }
}

/// Infer a rendering for a single `word` from the phrases containing it
///
/// Returns `None` when the word is not a single token, no phrase of two or
/// more tokens contains it, or no variant of such a phrase aligns token for
/// token.
pub fn infer<L: Lexicon>(word: &str, dictionary: &L) -> Option<InferredWord> {
    let word = normalize(word);
    if word.is_empty() || word.contains(' ') {
        return None;
    }

    let mut candidates: Vec<Candidate> = Vec::new();
    let mut by_script: HashMap<String, usize> = HashMap::new();

    for entry in dictionary.entries() {
        let tokens: Vec<&str> = entry.tokens().collect();
        if tokens.len() < 2 {
            continue;
        }
        let positions: Vec<usize> = tokens
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == word)
            .map(|(i, _)| i)
            .collect();
        if positions.is_empty() {
            continue;
        }

        for variant in &entry.script_variants {
            let variant_tokens = script_tokens(variant);
            if variant_tokens.len() != tokens.len() {
                continue;
            }

            for &position in &positions {
                let script = variant_tokens[position];
                let corroboration = corroborate(dictionary, &tokens, &variant_tokens, position);

                let index = *by_script.entry(script.to_lowercase()).or_insert_with(|| {
                    candidates.push(Candidate {
                        script: script.to_string(),
                        phrases: Vec::new(),
                        evidence: Vec::new(),
                    });
                    candidates.len() - 1
                });
                let candidate = &mut candidates[index];
                candidate.support(&entry.key, corroboration);
                candidate.evidence.push(Evidence {
                    phrase: entry.key.clone(),
                    variant: variant.clone(),
                    position,
                    corroboration,
                });
            }
        }
    }

    // strictly-greater comparison keeps the first-seen candidate on ties
    let mut winner: Option<Candidate> = None;
    for candidate in candidates {
        let better = match &winner {
            None => true,
            Some(best) => {
                (candidate.phrases.len(), candidate.corroboration())
                    > (best.phrases.len(), best.corroboration())
            }
        };
        if better {
            winner = Some(candidate);
        }
    }
    let winner = winner?;

    let supporting_phrases = winner.phrases.len();
    let confidence = Confidence::from_support(supporting_phrases);
    let reasoning = explain(&word, &winner, confidence);

    Some(InferredWord {
        word,
        script: winner.script,
        confidence,
        supporting_phrases,
        evidence: winner.evidence,
        reasoning,
    })
}

/// Run [`infer`] over each distinct word, keeping first-seen order
pub fn infer_all<L: Lexicon>(words: &[String], dictionary: &L) -> Vec<InferredWord> {
    let mut seen = std::collections::HashSet::new();
    words
        .iter()
        .filter(|w| seen.insert(w.as_str()))
        .filter_map(|w| infer(w, dictionary))
        .collect()
}

fn corroborate<L: Lexicon>(
    dictionary: &L,
    tokens: &[&str],
    variant_tokens: &[&str],
    position: usize,
) -> usize {
    tokens
        .iter()
        .zip(variant_tokens)
        .enumerate()
        .filter(|(j, _)| *j != position)
        .filter(|(_, (source, target))| {
            dictionary
                .get(source)
                .is_some_and(|entry| entry.has_script_token(target))
        })
        .count()
}

fn explain(word: &str, winner: &Candidate, confidence: Confidence) -> String {
    let trail = winner
        .evidence
        .iter()
        .map(|e| {
            format!(
                "\"{}\" → \"{}\" (position {}, {} corroborated)",
                e.phrase,
                e.variant,
                e.position + 1,
                e.corroboration
            )
        })
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "\"{}\" inferred as \"{}\" with {} confidence from {} phrase(s): {}",
        word,
        winner.script,
        confidence,
        winner.phrases.len(),
        trail
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::StaticDictionary;

    fn dict(pairs: &[(&str, &str)]) -> StaticDictionary {
        StaticDictionary::from_pairs(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_confidence_low_with_one_phrase() {
        let d = dict(&[("đi ngủ", "pây noòn")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.script, "noòn");
        assert_eq!(inferred.confidence, Confidence::Low);
        assert_eq!(inferred.supporting_phrases, 1);
    }

    #[test]
    fn test_confidence_medium_with_two_phrases() {
        let d = dict(&[("đi ngủ", "pây noòn"), ("ngủ say", "noòn lắc")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.script, "noòn");
        assert_eq!(inferred.confidence, Confidence::Medium);
        assert_eq!(inferred.supporting_phrases, 2);
    }

    #[test]
    fn test_confidence_high_with_three_phrases() {
        let d = dict(&[
            ("đi ngủ", "pây noòn"),
            ("ngủ say", "noòn lắc"),
            ("muốn ngủ", "ảư noòn"),
        ]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.confidence, Confidence::High);
        assert_eq!(inferred.supporting_phrases, 3);
        assert_eq!(inferred.evidence.len(), 3);
    }

    #[test]
    fn test_variants_of_one_phrase_count_once() {
        let d = dict(&[("đi ngủ", "pây noòn/pay noòn")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.supporting_phrases, 1);
        assert_eq!(inferred.confidence, Confidence::Low);
        assert_eq!(inferred.evidence.len(), 2);
    }

    #[test]
    fn test_misaligned_variants_are_skipped() {
        let d = dict(&[("đi ngủ", "pây bấu noòn/pây noòn")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.script, "noòn");
        assert_eq!(inferred.evidence.len(), 1);
        assert_eq!(inferred.evidence[0].variant, "pây noòn");
    }

    #[test]
    fn test_none_when_nothing_aligns() {
        let d = dict(&[("ngủ ngon", "noòn ngon đây")]);
        assert!(infer("ngủ", &d).is_none());
    }

    #[test]
    fn test_none_for_single_word_phrases_only() {
        let d = dict(&[("ngủ", "noòn")]);
        assert!(infer("ngủ", &d).is_none());
        assert!(infer("tôi", &d).is_none());
    }

    #[test]
    fn test_none_for_multi_token_input() {
        let d = dict(&[("đi ngủ", "pây noòn")]);
        assert!(infer("đi ngủ", &d).is_none());
        assert!(infer("   ", &d).is_none());
    }

    #[test]
    fn test_majority_candidate_wins() {
        let d = dict(&[
            ("a x", "p q"),
            ("b x", "r s"),
            ("c x", "t s"),
        ]);
        let inferred = infer("x", &d).unwrap();
        assert_eq!(inferred.script, "s");
        assert_eq!(inferred.confidence, Confidence::Medium);
    }

    #[test]
    fn test_spelling_variants_do_not_inflate_corroboration() {
        // "s" and "q" each have one phrase corroborated once; the two
        // spellings of "b x" must not double its score
        let d = dict(&[
            ("a", "r"),
            ("a x", "r s"),
            ("b", "p/pp"),
            ("b x", "p q/pp q"),
        ]);
        let inferred = infer("x", &d).unwrap();
        assert_eq!(inferred.script, "s");
        assert_eq!(inferred.evidence.len(), 1);
        assert_eq!(inferred.evidence[0].corroboration, 1);
    }

    #[test]
    fn test_corroboration_breaks_ties() {
        // "b" is confirmed as "r", so "b x" → "r s" outranks "a x" → "p q"
        let d = dict(&[("a x", "p q"), ("b", "r"), ("b x", "r s")]);
        let inferred = infer("x", &d).unwrap();
        assert_eq!(inferred.script, "s");
        assert_eq!(inferred.evidence[0].corroboration, 1);
    }

    #[test]
    fn test_first_seen_breaks_remaining_ties() {
        let d = dict(&[("b x", "r s"), ("a x", "p q")]);
        let inferred = infer("x", &d).unwrap();
        assert_eq!(inferred.script, "q");
    }

    #[test]
    fn test_candidates_grouped_case_insensitively() {
        let d = dict(&[("đi ngủ", "pây Noòn"), ("ngủ say", "noòn lắc")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.script, "Noòn");
        assert_eq!(inferred.supporting_phrases, 2);
    }

    #[test]
    fn test_repeated_word_in_phrase() {
        let d = dict(&[("ngủ ngủ", "noòn noòn")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert_eq!(inferred.supporting_phrases, 1);
        assert_eq!(inferred.evidence.len(), 2);
    }

    #[test]
    fn test_inference_is_deterministic() {
        let d = dict(&[
            ("đi ngủ", "pây noòn"),
            ("ngủ say", "noòn lắc/nòn lắc"),
            ("muốn ngủ", "ảư nòn"),
            ("đi", "pây"),
        ]);
        let first = infer("ngủ", &d).unwrap();
        for _ in 0..10 {
            assert_eq!(infer("ngủ", &d).unwrap(), first);
        }
    }

    #[test]
    fn test_reasoning_mentions_phrases() {
        let d = dict(&[("đi ngủ", "pây noòn"), ("đi", "pây")]);
        let inferred = infer("ngủ", &d).unwrap();
        assert!(inferred.reasoning.contains("\"đi ngủ\" → \"pây noòn\""));
        assert!(inferred.reasoning.contains("position 2"));
        assert!(inferred.reasoning.contains("1 corroborated"));
        assert!(inferred.reasoning.contains("low confidence"));
    }

    #[test]
    fn test_infer_all_dedupes() {
        let d = dict(&[("đi ngủ", "pây noòn")]);
        let words = vec!["ngủ".to_string(), "tôi".to_string(), "ngủ".to_string()];
        let inferred = infer_all(&words, &d);
        assert_eq!(inferred.len(), 1);
        assert_eq!(inferred[0].word, "ngủ");
    }
}
