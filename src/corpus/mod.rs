//! Corpus discovery and the train/test split.

pub mod document;
pub mod splitter;

pub use document::*;
pub use splitter::*;
