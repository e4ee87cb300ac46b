use crate::dictionary::{DictionaryEntry, StaticDictionary};
use crate::error::{LexError, LexResult};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a static dictionary from a JSON file
///
/// The JSON file should have the following structure:
/// ```json
/// {
///     "@metadata": { ... },
///     "đi ngủ": "pây noòn/pay nòn",
///     "ăn": { "script": "kin", "phonetic": "kin", "notes": "verb" }
/// }
/// ```
///
/// Keys starting with `@` are skipped. String values are `/`-separated script
/// variants; object values must carry a `script` string.
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON, or a root that is not an object
/// - Any malformed entry (the whole load is refused)
pub fn load_dictionary_from_file(path: &Path) -> LexResult<StaticDictionary> {
    let content = fs::read_to_string(path)
        .map_err(|e| LexError::Load(format!("Failed to read file '{}': {}", path.display(), e)))?;

    load_dictionary_from_str(&content).map_err(|e| match e {
        LexError::Load(msg) => LexError::Load(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Load a static dictionary from JSON text, see [`load_dictionary_from_file`]
pub fn load_dictionary_from_str(content: &str) -> LexResult<StaticDictionary> {
    let json: Value = serde_json::from_str(content)?;

    let obj = json
        .as_object()
        .ok_or_else(|| LexError::Load("root must be an object".to_string()))?;

    let mut dictionary = StaticDictionary::new();
    for (phrase, value) in obj {
        if phrase.starts_with('@') {
            continue;
        }
        dictionary.insert(parse_entry(phrase, value)?)?;
    }

    Ok(dictionary)
}

fn parse_entry(phrase: &str, value: &Value) -> LexResult<DictionaryEntry> {
    match value {
        Value::String(script) => DictionaryEntry::new(phrase, script),
        Value::Object(fields) => {
            let script = fields.get("script").and_then(Value::as_str).ok_or_else(|| {
                LexError::InvalidEntry(format!("phrase {:?} has no 'script' string", phrase))
            })?;
            let text_field = |name: &str| {
                fields
                    .get(name)
                    .and_then(Value::as_str)
                    .map(str::to_string)
            };
            Ok(DictionaryEntry::new(phrase, script)?
                .with_phonetic(text_field("phonetic"))
                .with_notes(text_field("notes")))
        }
        _ => Err(LexError::InvalidEntry(format!(
            "phrase {:?} must map to a string or an object",
            phrase
        ))),
    }
}
