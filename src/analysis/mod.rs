//! Document analysis: tokens, tokenizers and the document reader.

pub mod reader;
pub mod token;
pub mod tokenizer;

pub use reader::*;
pub use token::*;
pub use tokenizer::*;
