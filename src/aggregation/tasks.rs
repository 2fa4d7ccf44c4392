//! Word-count and document-count map tasks.

use crate::aggregation::executor::AggregationTask;
use crate::aggregation::table::PartialCounts;
use crate::analysis::DocumentReader;
use crate::corpus::ClassLabel;
use crate::error::{CorpusBayesError, Result};
use crate::storage::Storage;

/// Partial counts produced by one [`WordCountTask`].
#[derive(Debug, Clone, Default)]
pub struct ShardCounts {
    /// Token → occurrences within the shard.
    pub counts: PartialCounts,

    /// Number of documents read.
    pub documents: u64,

    /// Number of tokens emitted.
    pub tokens: u64,
}

/// Counts token occurrences over one shard of a class's train documents.
///
/// Every token occurrence emits `token → 1` into a private table, so shards
/// never share state.
#[derive(Debug, Clone)]
pub struct WordCountTask {
    task_id: String,
    paths: Vec<String>,
    reader: DocumentReader,
}

impl WordCountTask {
    /// Create a task over the documents at `paths`.
    pub fn new(class: &str, shard: usize, paths: Vec<String>, reader: DocumentReader) -> Self {
        Self {
            task_id: format!("wordcount-{class}-{shard}"),
            paths,
            reader,
        }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }
}

impl AggregationTask for WordCountTask {
    type Output = ShardCounts;

    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn execute(&self, storage: &dyn Storage) -> Result<ShardCounts> {
        let mut shard = ShardCounts::default();

        for path in &self.paths {
            let tokens = self.reader.read_tokens(storage, path)?;
            shard.tokens += tokens.len() as u64;
            for token in tokens {
                *shard.counts.entry(token).or_insert(0) += 1;
            }
            shard.documents += 1;
        }

        Ok(shard)
    }
}

/// Train-document count of one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCount {
    pub class: ClassLabel,
    pub documents: u64,
}

/// Counts the train documents of one class, independent of their content.
///
/// Each listed document must still exist; a missing one fails the task.
#[derive(Debug, Clone)]
pub struct DocumentCountTask {
    task_id: String,
    class: ClassLabel,
    paths: Vec<String>,
}

impl DocumentCountTask {
    pub fn new(class: &str, paths: Vec<String>) -> Self {
        Self {
            task_id: format!("doccount-{class}"),
            class: class.to_string(),
            paths,
        }
    }
}

impl AggregationTask for DocumentCountTask {
    type Output = DocumentCount;

    fn task_id(&self) -> &str {
        &self.task_id
    }

    fn execute(&self, storage: &dyn Storage) -> Result<DocumentCount> {
        for path in &self.paths {
            if !storage.exists(path) || storage.is_dir(path) {
                return Err(CorpusBayesError::storage(format!(
                    "Train document not found: {path}"
                )));
            }
        }

        Ok(DocumentCount {
            class: self.class.clone(),
            documents: self.paths.len() as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_word_count_task() {
        let storage = MemoryStorage::new_default();
        storage.put("data/USA/d1", "trade\ntariff\ntrade\n").unwrap();
        storage.put("data/USA/d2", "trade\nNew York\n").unwrap();

        let task = WordCountTask::new(
            "USA",
            0,
            vec!["data/USA/d1".to_string(), "data/USA/d2".to_string()],
            DocumentReader::default(),
        );
        let shard = task.execute(&storage).unwrap();

        assert_eq!(task.task_id(), "wordcount-USA-0");
        assert_eq!(shard.documents, 2);
        assert_eq!(shard.tokens, 5);
        assert_eq!(shard.counts["trade"], 3);
        assert_eq!(shard.counts["New York"], 1);
        assert_eq!(shard.counts.values().sum::<u64>(), shard.tokens);
    }

    #[test]
    fn test_word_count_task_missing_document() {
        let storage = MemoryStorage::new_default();
        let task = WordCountTask::new(
            "USA",
            0,
            vec!["data/USA/gone".to_string()],
            DocumentReader::default(),
        );

        assert!(task.execute(&storage).is_err());
    }

    #[test]
    fn test_document_count_task() {
        let storage = MemoryStorage::new_default();
        storage.put("data/UK/a", "x\n").unwrap();
        storage.put("data/UK/b", "y\n").unwrap();

        let task = DocumentCountTask::new(
            "UK",
            vec!["data/UK/a".to_string(), "data/UK/b".to_string()],
        );
        assert_eq!(
            task.execute(&storage).unwrap(),
            DocumentCount {
                class: "UK".to_string(),
                documents: 2
            }
        );

        let missing = DocumentCountTask::new("UK", vec!["data/UK/c".to_string()]);
        assert!(missing.execute(&storage).is_err());
    }
}
