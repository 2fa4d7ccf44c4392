//! Document classifier trait definition.

use crate::analysis::DocumentReader;
use crate::classifier::prediction::Prediction;
use crate::error::Result;
use crate::storage::Storage;

/// Document classifier trait.
///
/// Implementations score a token sequence against every known class and
/// return the best one.
pub trait DocumentClassifier: Send + Sync {
    /// Classify an already tokenized document.
    ///
    /// # Arguments
    /// * `tokens` - The document's tokens, in order and with duplicates
    ///
    /// # Returns
    /// The winning class together with the score of every class
    fn classify_tokens(&self, tokens: &[String]) -> Result<Prediction>;

    /// Read the document at `path` and classify it.
    ///
    /// A document that cannot be read is an error, not a prediction.
    fn classify_document(&self, storage: &dyn Storage, path: &str) -> Result<Prediction> {
        let tokens = self.reader().read_tokens(storage, path)?;
        self.classify_tokens(&tokens)
    }

    /// The reader used to tokenize stored documents.
    fn reader(&self) -> &DocumentReader;

    /// Get the name of this classifier for debugging and logging.
    fn name(&self) -> &str;
}
