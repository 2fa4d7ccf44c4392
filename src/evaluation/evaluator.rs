//! Classifier evaluation over the held-out test partition.

use std::sync::Arc;

use log::{debug, info};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::aggregation::Timer;
use crate::classifier::{DocumentClassifier, MultinomialClassifier};
use crate::corpus::{ClassLabel, CorpusSplit};
use crate::error::{CorpusBayesError, Result};
use crate::evaluation::confusion::ConfusionTally;
use crate::evaluation::report::EvaluationReport;
use crate::model::NaiveBayesModel;
use crate::storage::Storage;

/// Classifies every test document and scores the results.
///
/// Documents are classified in parallel; the model is only read. Outcomes are
/// then tallied sequentially into one confusion matrix per class.
pub struct Evaluator {
    thread_pool: Arc<ThreadPool>,
}

impl std::fmt::Debug for Evaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("num_threads", &self.thread_pool.current_num_threads())
            .finish()
    }
}

impl Evaluator {
    /// Create an evaluator. `None` uses one thread per CPU core.
    pub fn new(thread_pool_size: Option<usize>) -> Result<Self> {
        let num_threads = thread_pool_size.unwrap_or_else(num_cpus::get);
        if num_threads == 0 {
            return Err(CorpusBayesError::invalid_config(
                "thread_pool_size must be greater than zero",
            ));
        }

        let thread_pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("evaluation-{i}"))
            .build()
            .map_err(|e| {
                CorpusBayesError::internal(format!("Failed to create thread pool: {e}"))
            })?;

        Ok(Self {
            thread_pool: Arc::new(thread_pool),
        })
    }

    /// Evaluate `model` on its own test partition, reading documents below `dataset_root`.
    pub fn evaluate(
        &self,
        storage: &dyn Storage,
        dataset_root: &str,
        model: Arc<NaiveBayesModel>,
    ) -> Result<EvaluationReport> {
        let split = model.split();
        let classifier = MultinomialClassifier::new(model);
        self.evaluate_with(&classifier, storage, dataset_root, &split)
    }

    /// Evaluate any classifier on the test lists of `split`.
    pub fn evaluate_with(
        &self,
        classifier: &dyn DocumentClassifier,
        storage: &dyn Storage,
        dataset_root: &str,
        split: &CorpusSplit,
    ) -> Result<EvaluationReport> {
        let timer = Timer::start();
        let documents = split.test_refs();
        info!(
            "Evaluating {} on {} test documents",
            classifier.name(),
            documents.len()
        );

        let outcomes: Vec<(ClassLabel, ClassLabel)> = self.thread_pool.install(|| {
            documents
                .par_iter()
                .map(|doc| -> Result<(ClassLabel, ClassLabel)> {
                    let prediction = classifier.classify_document(storage, &doc.path(dataset_root))?;
                    debug!("{doc} -> {}", prediction.label);
                    Ok((doc.class.clone(), prediction.label))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let test_counts = split
            .test()
            .iter()
            .map(|(class, docs)| (class.clone(), docs.len() as u64))
            .collect();
        let mut tally = ConfusionTally::new(test_counts);
        for (actual, predicted) in &outcomes {
            tally.record(actual, predicted)?;
        }
        let matrices = tally.complete()?;

        let report = EvaluationReport::from_matrices(classifier.name(), matrices, timer.stop());
        info!(
            "Accuracy {} ({}/{}), macro F1 {}, micro F1 {}",
            report.accuracy,
            report.correct,
            report.total_test_docs,
            report.macro_average.f1,
            report.micro_average.f1
        );
        Ok(report)
    }
}
