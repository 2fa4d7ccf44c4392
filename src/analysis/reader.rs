//! Reading stored documents as token sequences.

use std::io::Read;
use std::sync::Arc;

use crate::analysis::tokenizer::{LineTokenizer, Tokenizer};
use crate::error::{CorpusBayesError, Result};
use crate::storage::Storage;

/// Reads documents from a [`Storage`] and tokenizes them.
///
/// Documents are read once, in full, and never modified. A document that cannot
/// be opened or is not valid UTF-8 is an error for the caller to handle.
#[derive(Debug, Clone)]
pub struct DocumentReader {
    tokenizer: Arc<dyn Tokenizer>,
}

impl DocumentReader {
    /// Create a reader using the given tokenizer.
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        Self { tokenizer }
    }

    /// The tokenizer used by this reader.
    pub fn tokenizer(&self) -> &dyn Tokenizer {
        self.tokenizer.as_ref()
    }

    /// Read the document at `path` and return its tokens in order.
    pub fn read_tokens(&self, storage: &dyn Storage, path: &str) -> Result<Vec<String>> {
        let mut input = storage.open_input(path)?;
        let mut text = String::new();
        input.read_to_string(&mut text).map_err(|e| {
            CorpusBayesError::storage(format!("Failed to read document {path}: {e}"))
        })?;

        Ok(self.tokenizer.tokenize(&text)?.map(|t| t.text).collect())
    }
}

impl Default for DocumentReader {
    fn default() -> Self {
        Self::new(Arc::new(LineTokenizer::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_read_tokens() {
        let storage = MemoryStorage::new_default();
        storage.put("USA/doc_1", "trade\ntariff\ntrade\n").unwrap();

        let reader = DocumentReader::default();
        let tokens = reader.read_tokens(&storage, "USA/doc_1").unwrap();

        assert_eq!(tokens, vec!["trade", "tariff", "trade"]);
        assert_eq!(reader.tokenizer().name(), "line");
    }

    #[test]
    fn test_missing_document_is_error() {
        let storage = MemoryStorage::new_default();
        let reader = DocumentReader::default();

        assert!(reader.read_tokens(&storage, "USA/missing").is_err());
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let storage = MemoryStorage::new_default();
        storage.put("USA/binary", [0xffu8, 0xfe, 0x0a]).unwrap();

        let err = DocumentReader::default()
            .read_tokens(&storage, "USA/binary")
            .unwrap_err();
        assert!(err.to_string().contains("USA/binary"));
    }
}
