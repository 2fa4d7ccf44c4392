//! Multinomial Naive Bayes classifier.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::trace;

use crate::analysis::DocumentReader;
use crate::classifier::prediction::Prediction;
use crate::classifier::traits::DocumentClassifier;
use crate::corpus::ClassLabel;
use crate::error::{CorpusBayesError, Result};
use crate::model::NaiveBayesModel;

/// Scores documents with a trained [`NaiveBayesModel`].
///
/// A class's score starts at its prior and adds the log-likelihood of every
/// token occurrence, so repeated tokens count once per occurrence. Classes are
/// scanned in ascending label order and a later class only takes over the lead
/// with a strictly greater score, so ties go to the smallest label.
#[derive(Debug, Clone)]
pub struct MultinomialClassifier {
    model: Arc<NaiveBayesModel>,
    reader: DocumentReader,
}

impl MultinomialClassifier {
    /// Create a classifier over a shared model.
    pub fn new(model: Arc<NaiveBayesModel>) -> Self {
        Self {
            model,
            reader: DocumentReader::default(),
        }
    }

    /// Use a different document reader.
    pub fn with_reader(mut self, reader: DocumentReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn model(&self) -> &NaiveBayesModel {
        &self.model
    }

    /// Posterior log-score of every class for `tokens`.
    pub fn scores(&self, tokens: &[String]) -> BTreeMap<ClassLabel, f64> {
        self.model
            .priors()
            .iter()
            .map(|(class, prior)| {
                let score = tokens.iter().fold(*prior, |acc, token| {
                    acc + self
                        .model
                        .log_likelihood(token, class)
                        .unwrap_or(f64::NEG_INFINITY)
                });
                (class.clone(), score)
            })
            .collect()
    }
}

impl DocumentClassifier for MultinomialClassifier {
    fn classify_tokens(&self, tokens: &[String]) -> Result<Prediction> {
        if self.model.is_empty() {
            return Err(CorpusBayesError::model("Cannot classify with an empty model"));
        }

        let scores = self.scores(tokens);

        let mut best: Option<(&ClassLabel, f64)> = None;
        for (class, score) in &scores {
            match best {
                Some((_, best_score)) if *score <= best_score => {}
                _ => best = Some((class, *score)),
            }
        }

        let label = best
            .map(|(class, _)| class.clone())
            .ok_or_else(|| CorpusBayesError::model("No class could be scored"))?;
        trace!("Classified {} tokens as {label}", tokens.len());

        Ok(Prediction { label, scores })
    }

    fn reader(&self) -> &DocumentReader {
        &self.reader
    }

    fn name(&self) -> &str {
        "multinomial"
    }
}
