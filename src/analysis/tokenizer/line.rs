//! Line tokenizer implementation.

use super::Tokenizer;

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// A tokenizer that emits every line of the input as one token.
///
/// The line content is taken literally (no trimming, no case folding). Line
/// terminators (`\n`, `\r\n`) are not part of the token, and an empty line is
/// an empty token. A trailing terminator does not produce an extra token.
#[derive(Clone, Debug, Default)]
pub struct LineTokenizer;

impl LineTokenizer {
    /// Create a new line tokenizer.
    pub fn new() -> Self {
        LineTokenizer
    }
}

impl Tokenizer for LineTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        let mut offset = 0;

        for (position, raw) in text.split_inclusive('\n').enumerate() {
            let line = raw
                .strip_suffix('\n')
                .map(|l| l.strip_suffix('\r').unwrap_or(l))
                .unwrap_or(raw);
            tokens.push(Token::with_offsets(
                line,
                position,
                offset,
                offset + line.len(),
            ));
            offset += raw.len();
        }

        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "line"
    }
}
