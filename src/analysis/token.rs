//! Token types for document analysis.
//!
//! A [`Token`] is the atomic unit counted by the word-frequency tables. Tokens are
//! case-sensitive and never normalized: two tokens are equal exactly when their
//! text is byte-for-byte equal.
//!
//! # Examples
//!
//! ```
//! use corpus_bayes::analysis::token::Token;
//!
//! let token = Token::with_offsets("tariff", 1, 6, 12);
//! assert_eq!(token.text, "tariff");
//! assert_eq!(token.position, 1);
//! assert_eq!(token.end_offset, 12);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single token produced by a tokenizer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    /// The text content of the token
    pub text: String,

    /// The position of the token in the token stream (0-based)
    pub position: usize,

    /// The byte offset where this token starts in the original text
    pub start_offset: usize,

    /// The byte offset where this token ends in the original text
    pub end_offset: usize,
}

impl Token {
    /// Create a new token with the given text and position.
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        let text = text.into();
        let end_offset = text.len();
        Token {
            text,
            position,
            start_offset: 0,
            end_offset,
        }
    }

    /// Create a new token with explicit byte offsets.
    pub fn with_offsets<S: Into<String>>(
        text: S,
        position: usize,
        start_offset: usize,
        end_offset: usize,
    ) -> Self {
        Token {
            text: text.into(),
            position,
            start_offset,
            end_offset,
        }
    }

    /// Consume the token, returning its text.
    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// A boxed iterator of tokens.
pub type TokenStream = Box<dyn Iterator<Item = Token> + Send>;
