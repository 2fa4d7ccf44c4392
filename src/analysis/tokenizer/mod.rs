//! Tokenizer implementations.
//!
//! Tokenizers turn document text into an ordered [`TokenStream`]. The corpus
//! format stores one token per line, which [`line::LineTokenizer`] reads
//! literally.
//!
//! # Examples
//!
//! ```
//! use corpus_bayes::analysis::tokenizer::{LineTokenizer, Tokenizer};
//!
//! let tokenizer = LineTokenizer::new();
//! let tokens: Vec<_> = tokenizer.tokenize("trade\ntariff\n").unwrap().collect();
//! assert_eq!(tokens.len(), 2);
//! assert_eq!(tokens[1].text, "tariff");
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for tokenizers that convert text into tokens.
///
/// The trait requires `Send + Sync` so one tokenizer can be shared by all
/// aggregation and classification workers.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Tokenize the given text into a stream of tokens.
    fn tokenize(&self, text: &str) -> Result<TokenStream>;

    /// Get the name of this tokenizer (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod line;

pub use line::LineTokenizer;
