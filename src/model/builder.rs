//! Building a model from aggregated counts.

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::aggregation::{AggregationOutput, WordFrequencyTable};
use crate::corpus::{ClassLabel, CorpusSplit};
use crate::error::{CorpusBayesError, Result};
use crate::model::naive_bayes::NaiveBayesModel;

/// Laplace-smoothed log prior: `ln((class_docs + 1) / (total_docs + num_classes))`.
pub fn log_prior(class_docs: u64, total_docs: u64, num_classes: usize) -> f64 {
    ((class_docs + 1) as f64 / (total_docs + num_classes as u64) as f64).ln()
}

/// Assembles a [`NaiveBayesModel`] from a split and its aggregated counts.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use corpus_bayes::aggregation::WordFrequencyTable;
/// use corpus_bayes::corpus::CorpusSplit;
/// use corpus_bayes::model::ModelBuilder;
///
/// let mut train = BTreeMap::new();
/// train.insert("A".to_string(), vec!["a1".to_string()]);
/// train.insert("B".to_string(), vec!["b1".to_string()]);
/// let split = CorpusSplit::from_parts(train, BTreeMap::new());
///
/// let model = ModelBuilder::new(split)
///     .add_class_counts("A", [("x".to_string(), 3)].into_iter().collect::<WordFrequencyTable>())
///     .add_class_counts("B", [("y".to_string(), 2)].into_iter().collect::<WordFrequencyTable>())
///     .build()
///     .unwrap();
///
/// assert_eq!(model.num_classes(), 2);
/// assert_eq!(model.total_words("A"), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    split: CorpusSplit,
    document_counts: Option<BTreeMap<ClassLabel, u64>>,
    word_counts: BTreeMap<ClassLabel, WordFrequencyTable>,
}

impl ModelBuilder {
    /// Start building from a train/test split.
    pub fn new(split: CorpusSplit) -> Self {
        Self {
            split,
            document_counts: None,
            word_counts: BTreeMap::new(),
        }
    }

    /// Use aggregated train-document counts for the priors.
    ///
    /// Without this the counts are taken from the split's train lists.
    pub fn with_document_counts(mut self, counts: BTreeMap<ClassLabel, u64>) -> Self {
        self.document_counts = Some(counts);
        self
    }

    /// Set the frequency table of one class.
    pub fn add_class_counts(mut self, class: impl Into<ClassLabel>, table: WordFrequencyTable) -> Self {
        self.word_counts.insert(class.into(), table);
        self
    }

    /// Take document counts and all frequency tables from an aggregation run.
    pub fn with_aggregation(mut self, output: AggregationOutput) -> Self {
        self.document_counts = Some(output.document_counts);
        self.word_counts.extend(output.word_counts);
        self
    }

    /// Compute the priors and validate the result.
    ///
    /// Every class of the split needs a document count and a frequency
    /// table, and no counts may name a class outside the split. A missing
    /// class fails the build; the model is never partially populated.
    pub fn build(self) -> Result<NaiveBayesModel> {
        let num_classes = self.split.num_classes();
        if num_classes == 0 {
            return Err(CorpusBayesError::model("Cannot build a model without classes"));
        }

        let document_counts = match self.document_counts {
            Some(counts) => counts,
            None => self
                .split
                .train()
                .iter()
                .map(|(class, docs)| (class.clone(), docs.len() as u64))
                .collect(),
        };

        for class in document_counts.keys().chain(self.word_counts.keys()) {
            if self.split.train().get(class).is_none() {
                return Err(CorpusBayesError::model(format!(
                    "Counts given for class {class} which is not part of the split"
                )));
            }
        }

        let total_train_docs: u64 = document_counts.values().sum();
        let mut priors = BTreeMap::new();
        let mut total_words = BTreeMap::new();
        let word_counts = self.word_counts;

        for class in self.split.classes() {
            let docs = *document_counts.get(class).ok_or_else(|| {
                CorpusBayesError::model(format!("No document count for class {class}"))
            })?;
            let table = word_counts.get(class).ok_or_else(|| {
                CorpusBayesError::model(format!("No word counts for class {class}"))
            })?;

            let prior = log_prior(docs, total_train_docs, num_classes);
            debug!(
                "Class {class}: {docs} documents, {} words, vocabulary {}, prior {prior:.4}",
                table.total(),
                table.vocabulary_size()
            );
            priors.insert(class.clone(), prior);
            total_words.insert(class.clone(), table.total());
        }

        let (train_docs, test_docs) = self.split.into_parts();
        let model = NaiveBayesModel::from_parts(
            train_docs,
            test_docs,
            priors,
            total_train_docs,
            total_words,
            word_counts,
        )?;

        for class in model.empty_classes() {
            warn!(
                "Class {class} has no training tokens; its likelihood denominator is zero \
                 and it will win every non-empty document"
            );
        }

        info!(
            "Built model with {} classes from {} train documents",
            model.num_classes(),
            model.total_train_docs()
        );
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, u64)]) -> WordFrequencyTable {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    fn split(train: &[(&str, usize)], test: &[(&str, usize)]) -> CorpusSplit {
        let docs = |(c, n): &(&str, usize)| {
            let names: Vec<String> = (0..*n).map(|i| format!("{c}-{i}")).collect();
            (c.to_string(), names)
        };
        CorpusSplit::from_parts(
            train.iter().map(docs).collect(),
            test.iter().map(docs).collect(),
        )
    }

    #[test]
    fn test_log_prior() {
        assert!((log_prior(3, 10, 2) - (4.0f64 / 12.0).ln()).abs() < 1e-12);
        assert!((log_prior(0, 0, 4) - 0.25f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_build_priors() {
        let model = ModelBuilder::new(split(&[("A", 6), ("B", 2), ("C", 0)], &[("A", 1)]))
            .add_class_counts("A", table(&[("x", 3)]))
            .add_class_counts("B", table(&[("y", 1)]))
            .add_class_counts("C", WordFrequencyTable::new())
            .build()
            .unwrap();

        assert_eq!(model.total_train_docs(), 8);
        assert!((model.prior("A").unwrap() - (7.0f64 / 11.0).ln()).abs() < 1e-12);
        assert!((model.prior("C").unwrap() - (1.0f64 / 11.0).ln()).abs() < 1e-12);

        let mass: f64 = model.priors().values().map(|p| p.exp()).sum();
        assert!((mass - 1.0).abs() < 1e-12);
        for prior in model.priors().values() {
            assert!(*prior <= 0.0);
            assert!(prior.exp() > 0.0 && prior.exp() < 1.0);
        }
    }

    #[test]
    fn test_document_counts_override_split() {
        let mut counts = BTreeMap::new();
        counts.insert("A".to_string(), 9);
        counts.insert("B".to_string(), 1);

        let model = ModelBuilder::new(split(&[("A", 1), ("B", 1)], &[]))
            .with_document_counts(counts)
            .add_class_counts("A", table(&[("x", 1)]))
            .add_class_counts("B", table(&[("y", 1)]))
            .build()
            .unwrap();

        assert_eq!(model.total_train_docs(), 10);
        assert!((model.prior("A").unwrap() - (10.0f64 / 12.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_total_words_match_tables() {
        let model = ModelBuilder::new(split(&[("A", 1), ("B", 1)], &[]))
            .add_class_counts("A", table(&[("x", 3), ("y", 1)]))
            .add_class_counts("B", table(&[("y", 2), ("z", 2)]))
            .build()
            .unwrap();

        for class in ["A", "B"] {
            let sum: u64 = model.word_counts(class).unwrap().iter().map(|(_, c)| c).sum();
            assert_eq!(sum, model.total_words(class));
        }
    }

    #[test]
    fn test_missing_class_counts_fail() {
        let result = ModelBuilder::new(split(&[("A", 1), ("B", 1)], &[]))
            .add_class_counts("A", table(&[("x", 1)]))
            .build();
        assert!(matches!(result, Err(CorpusBayesError::Model(_))));
    }

    #[test]
    fn test_unknown_class_counts_fail() {
        let result = ModelBuilder::new(split(&[("A", 1)], &[]))
            .add_class_counts("A", table(&[("x", 1)]))
            .add_class_counts("Z", table(&[("x", 1)]))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_split_fails() {
        assert!(ModelBuilder::new(CorpusSplit::default()).build().is_err());
    }
}
