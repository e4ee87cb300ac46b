/// Error types for dictionary loading, overlay refresh and gateway calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A dictionary entry that cannot be indexed (empty variant, empty phrase, duplicate key)
    InvalidEntry(String),
    /// Dictionary source could not be read or has the wrong shape
    Load(String),
    /// Missing or invalid configuration
    Config(String),
    /// Locale code that cannot be parsed
    InvalidLocale(String),
    /// Transport-level failure talking to a remote service
    Network(String),
    /// Contribution store returned an error or an unreadable payload
    Store(String),
    /// Translation oracle failure
    Translation(String),
    /// A remote call did not finish within its deadline
    Timeout(String),
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LexError::InvalidEntry(msg) => write!(f, "Invalid dictionary entry: {}", msg),
            LexError::Load(msg) => write!(f, "Dictionary load error: {}", msg),
            LexError::Config(msg) => write!(f, "Configuration error: {}", msg),
            LexError::InvalidLocale(msg) => write!(f, "Invalid locale: {}", msg),
            LexError::Network(msg) => write!(f, "Network error: {}", msg),
            LexError::Store(msg) => write!(f, "Contribution store error: {}", msg),
            LexError::Translation(msg) => write!(f, "Translation error: {}", msg),
            LexError::Timeout(msg) => write!(f, "Timed out: {}", msg),
        }
    }
}

impl std::error::Error for LexError {}

impl From<reqwest::Error> for LexError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LexError::Timeout(err.to_string())
        } else {
            LexError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LexError {
    fn from(err: serde_json::Error) -> Self {
        LexError::Load(format!("Invalid JSON: {}", err))
    }
}

/// Result type for lexicon operations
pub type LexResult<T> = Result<T, LexError>;
