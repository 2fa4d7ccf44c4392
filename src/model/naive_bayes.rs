//! The trained multinomial Naive Bayes model.

use std::collections::{BTreeMap, BTreeSet};

use crate::aggregation::WordFrequencyTable;
use crate::corpus::{ClassLabel, CorpusSplit};
use crate::error::{CorpusBayesError, Result};

/// Trained classifier state.
///
/// Holds the prior log-probability, the word frequency table and the total
/// word count of every class, plus the train/test partition the model was
/// built from. All class-keyed maps share one key set and iterate in
/// ascending label order. A model is built once and never updated.
#[derive(Debug, Clone, PartialEq)]
pub struct NaiveBayesModel {
    pub(crate) train_docs: BTreeMap<ClassLabel, Vec<String>>,
    pub(crate) test_docs: BTreeMap<ClassLabel, Vec<String>>,
    pub(crate) priors: BTreeMap<ClassLabel, f64>,
    pub(crate) total_train_docs: u64,
    pub(crate) total_words: BTreeMap<ClassLabel, u64>,
    pub(crate) word_counts: BTreeMap<ClassLabel, WordFrequencyTable>,
}

impl NaiveBayesModel {
    /// Assemble a model from its parts and validate it.
    pub fn from_parts(
        train_docs: BTreeMap<ClassLabel, Vec<String>>,
        test_docs: BTreeMap<ClassLabel, Vec<String>>,
        priors: BTreeMap<ClassLabel, f64>,
        total_train_docs: u64,
        total_words: BTreeMap<ClassLabel, u64>,
        word_counts: BTreeMap<ClassLabel, WordFrequencyTable>,
    ) -> Result<Self> {
        let model = Self {
            train_docs,
            test_docs,
            priors,
            total_train_docs,
            total_words,
            word_counts,
        };
        model.validate()?;
        Ok(model)
    }

    /// Check the model invariants.
    ///
    /// * the class set is identical across the train, test, prior, total-word
    ///   and word-count maps;
    /// * every prior is a finite log-probability (`<= 0`);
    /// * the counts of every class's table sum to its total word count.
    pub fn validate(&self) -> Result<()> {
        let classes: BTreeSet<&ClassLabel> = self.train_docs.keys().collect();

        let same_keys = |name: &str, keys: BTreeSet<&ClassLabel>| {
            if keys == classes {
                Ok(())
            } else {
                Err(CorpusBayesError::model(format!(
                    "Class set of {name} {keys:?} differs from train classes {classes:?}"
                )))
            }
        };
        same_keys("test documents", self.test_docs.keys().collect())?;
        same_keys("priors", self.priors.keys().collect())?;
        same_keys("total words", self.total_words.keys().collect())?;
        same_keys("word counts", self.word_counts.keys().collect())?;

        for (class, prior) in &self.priors {
            if !prior.is_finite() || *prior > 0.0 {
                return Err(CorpusBayesError::model(format!(
                    "Prior of class {class} is not a log-probability: {prior}"
                )));
            }
        }

        for (class, table) in &self.word_counts {
            let sum: u64 = table.iter().map(|(_, c)| c).sum();
            let total = self.total_words[class];
            if sum != total || table.total() != total {
                return Err(CorpusBayesError::model(format!(
                    "Word counts of class {class} sum to {sum}, expected {total}"
                )));
            }
        }

        Ok(())
    }

    /// Class labels in ascending order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassLabel> {
        self.priors.keys()
    }

    pub fn num_classes(&self) -> usize {
        self.priors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }

    pub fn contains_class(&self, class: &str) -> bool {
        self.priors.contains_key(class)
    }

    /// Prior log-probability of `class`.
    pub fn prior(&self, class: &str) -> Option<f64> {
        self.priors.get(class).copied()
    }

    /// All priors keyed by class.
    pub fn priors(&self) -> &BTreeMap<ClassLabel, f64> {
        &self.priors
    }

    /// Number of distinct tokens observed in `class`.
    pub fn vocabulary_size(&self, class: &str) -> usize {
        self.word_counts
            .get(class)
            .map(WordFrequencyTable::vocabulary_size)
            .unwrap_or(0)
    }

    /// Total token occurrences observed in `class`.
    pub fn total_words(&self, class: &str) -> u64 {
        self.total_words.get(class).copied().unwrap_or(0)
    }

    /// Occurrences of `token` in `class`.
    pub fn word_count(&self, token: &str, class: &str) -> u64 {
        self.word_counts
            .get(class)
            .map(|t| t.get(token))
            .unwrap_or(0)
    }

    /// The frequency table of `class`.
    pub fn word_counts(&self, class: &str) -> Option<&WordFrequencyTable> {
        self.word_counts.get(class)
    }

    /// Number of train documents over all classes.
    pub fn total_train_docs(&self) -> u64 {
        self.total_train_docs
    }

    /// Total test documents over all classes.
    pub fn total_test_docs(&self) -> u64 {
        self.test_docs.values().map(|d| d.len() as u64).sum()
    }

    pub fn train_docs(&self, class: &str) -> &[String] {
        self.train_docs.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn test_docs(&self, class: &str) -> &[String] {
        self.test_docs.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The train/test partition this model was built from.
    pub fn split(&self) -> CorpusSplit {
        CorpusSplit::from_parts(self.train_docs.clone(), self.test_docs.clone())
    }

    /// Whether `class` saw no training tokens at all.
    pub fn has_empty_vocabulary(&self, class: &str) -> bool {
        self.word_counts
            .get(class)
            .is_some_and(|table| table.total() + table.vocabulary_size() as u64 == 0)
    }

    /// Classes that saw no training tokens, in ascending label order.
    pub fn empty_classes(&self) -> impl Iterator<Item = &ClassLabel> {
        self.word_counts
            .keys()
            .filter(|class| self.has_empty_vocabulary(class))
    }

    /// Smoothed probability of `token` given `class`:
    /// `(count + 1) / (total_words + vocabulary_size)`.
    ///
    /// The vocabulary size is that of the class itself. A class that saw no
    /// tokens at all has a zero denominator, and the ratio is taken as positive
    /// infinity for every token. Returns `None` for an unknown class.
    pub fn likelihood(&self, token: &str, class: &str) -> Option<f64> {
        let table = self.word_counts.get(class)?;
        let denominator = table.total() + table.vocabulary_size() as u64;
        if denominator == 0 {
            return Some(f64::INFINITY);
        }
        Some((table.get(token) + 1) as f64 / denominator as f64)
    }

    /// Natural log of [`likelihood`](Self::likelihood).
    ///
    /// Positive infinity for a class that saw no tokens, so such a class wins
    /// any non-empty document.
    pub fn log_likelihood(&self, token: &str, class: &str) -> Option<f64> {
        self.likelihood(token, class).map(f64::ln)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, u64)]) -> WordFrequencyTable {
        pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
    }

    fn two_class_model() -> NaiveBayesModel {
        let mut train = BTreeMap::new();
        train.insert("A".to_string(), vec!["a1".to_string()]);
        train.insert("B".to_string(), vec!["b1".to_string()]);
        let mut test = BTreeMap::new();
        test.insert("A".to_string(), Vec::new());
        test.insert("B".to_string(), vec!["b2".to_string()]);

        let mut priors = BTreeMap::new();
        priors.insert("A".to_string(), 0.5f64.ln());
        priors.insert("B".to_string(), 0.5f64.ln());

        let mut totals = BTreeMap::new();
        totals.insert("A".to_string(), 4);
        totals.insert("B".to_string(), 4);

        let mut words = BTreeMap::new();
        words.insert("A".to_string(), table(&[("x", 3), ("y", 1)]));
        words.insert("B".to_string(), table(&[("y", 2), ("z", 2)]));

        NaiveBayesModel::from_parts(train, test, priors, 2, totals, words).unwrap()
    }

    #[test]
    fn test_likelihood_uses_class_vocabulary() {
        let model = two_class_model();

        assert!((model.likelihood("x", "A").unwrap() - 4.0 / 6.0).abs() < 1e-12);
        assert!((model.likelihood("x", "B").unwrap() - 1.0 / 6.0).abs() < 1e-12);
        assert!((model.likelihood("unseen", "A").unwrap() - 1.0 / 6.0).abs() < 1e-12);
        assert!(model.likelihood("x", "C").is_none());
        assert!(
            (model.log_likelihood("y", "B").unwrap() - (3.0f64 / 6.0).ln()).abs() < 1e-12
        );
    }

    #[test]
    fn test_accessors() {
        let model = two_class_model();

        assert_eq!(model.classes().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(model.vocabulary_size("A"), 2);
        assert_eq!(model.total_words("B"), 4);
        assert_eq!(model.word_count("z", "B"), 2);
        assert_eq!(model.word_count("z", "A"), 0);
        assert_eq!(model.total_train_docs(), 2);
        assert_eq!(model.total_test_docs(), 1);
        assert_eq!(model.test_docs("B"), ["b2".to_string()]);
        assert_eq!(model.split().total_test_docs(), 1);
    }

    #[test]
    fn test_mismatched_class_sets_rejected() {
        let mut model = two_class_model();
        model.priors.remove("B");
        assert!(matches!(model.validate(), Err(CorpusBayesError::Model(_))));
    }

    #[test]
    fn test_total_words_mismatch_rejected() {
        let mut model = two_class_model();
        model.total_words.insert("A".to_string(), 5);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_positive_prior_rejected() {
        let mut model = two_class_model();
        model.priors.insert("A".to_string(), 0.3);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_empty_class_likelihood() {
        let mut model = two_class_model();
        model.word_counts.insert("A".to_string(), WordFrequencyTable::new());
        model.total_words.insert("A".to_string(), 0);

        assert!(model.validate().is_ok());
        assert_eq!(model.likelihood("x", "A"), Some(f64::INFINITY));
        assert_eq!(model.log_likelihood("x", "A"), Some(f64::INFINITY));
        assert!(model.has_empty_vocabulary("A"));
        assert!(!model.has_empty_vocabulary("B"));
        assert_eq!(model.empty_classes().collect::<Vec<_>>(), vec!["A"]);
    }
}
