//! Normalization and tokenization shared by the dictionary, matcher and resolver
//!
//! Dictionary keys and user input go through the same [`normalize`] so that a
//! phrase stored as `"Đi ngủ"` is found in `"tôi  ĐI NGỦ!"`.

use regex::Regex;
use std::sync::LazyLock;

/// Anything that is not a letter, combining mark, digit or whitespace
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{M}\p{N}\s]+").expect("valid punctuation regex"));

/// Lowercase, strip punctuation and collapse runs of whitespace
///
/// # Example
///
/// ```ignore
/// assert_eq!(normalize("  Tôi, đi   NGỦ! "), "tôi đi ngủ");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = PUNCTUATION.replace_all(&lowered, " ");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split normalized text into tokens
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split a target-script rendering into tokens, keeping its original casing
pub fn script_tokens(script: &str) -> Vec<&str> {
    script.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_case_and_whitespace() {
        assert_eq!(normalize("  Tôi  đi\tNGỦ "), "tôi đi ngủ");
    }

    #[test]
    fn test_normalize_strips_punctuation() {
        assert_eq!(normalize("đi ngủ!"), "đi ngủ");
        assert_eq!(normalize("ăn, uống."), "ăn uống");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize("   "), "");
        assert_eq!(normalize("?!"), "");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Tôi đi ngủ."), vec!["tôi", "đi", "ngủ"]);
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_script_tokens_keep_case() {
        assert_eq!(script_tokens(" Pây  noòn "), vec!["Pây", "noòn"]);
    }
}
