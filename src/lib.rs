//! Tiered lexical lookup and inference
//!
//! Resolves source-language text word by word against a static phrase
//! dictionary, an overlay of approved community contributions, positional
//! inference over multi-word entries and, for whatever is left, an external
//! translation gateway.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lexitier::{Resolver, StaticDictionary};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dictionary = StaticDictionary::from_pairs([("đi ngủ", "pây noòn"), ("đi", "pây")])?;
//!     let resolver = Resolver::new(Arc::new(dictionary));
//!
//!     let result = resolver.resolve("tôi đi ngủ").await;
//!     assert_eq!(result.unresolved, vec!["tôi"]);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dictionary;
pub mod error;
pub mod inference;
pub mod loader;
pub mod matcher;
pub mod mt;
pub mod overlay;
pub mod resolver;
pub mod text;


pub use config::ResolverConfig;
pub use dictionary::{DictionaryEntry, Lexicon, MergedDictionary, Provenance, StaticDictionary};
pub use error::{LexError, LexResult};
pub use inference::{Confidence, Evidence, InferredWord, infer, infer_all};
pub use loader::{load_dictionary_from_file, load_dictionary_from_str};
pub use matcher::{PhraseMatch, PhraseMatches, match_phrases, match_tokens};
pub use overlay::{OverlayCache, OverlaySnapshot, OverlayState, build_overlay, fail_open};
pub use resolver::{DirectMatch, ResolutionResult, Resolver};
