//! Evaluation results and their averages.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::corpus::ClassLabel;
use crate::evaluation::confusion::ConfusionMatrix;
use crate::evaluation::metric::Metric;

/// Per-class quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub class: ClassLabel,
    pub matrix: ConfusionMatrix,
    /// Number of test documents of this class.
    pub support: u64,
    pub precision: Metric,
    pub recall: Metric,
    pub f1: Metric,
}

impl ClassMetrics {
    pub fn from_matrix(class: impl Into<ClassLabel>, matrix: ConfusionMatrix) -> Self {
        Self {
            class: class.into(),
            support: matrix.true_positive + matrix.false_negative,
            precision: matrix.precision(),
            recall: matrix.recall(),
            f1: matrix.f1(),
            matrix,
        }
    }
}

/// Averaged precision, recall and F1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedMetrics {
    pub precision: Metric,
    pub recall: Metric,
    pub f1: Metric,

    /// Classes left out of the precision average because theirs was undefined.
    pub excluded_from_precision: usize,

    /// Classes left out of the recall average because theirs was undefined.
    pub excluded_from_recall: usize,
}

impl AveragedMetrics {
    /// Unweighted mean over classes of the defined per-class values.
    ///
    /// F1 is the harmonic mean of the averaged precision and recall.
    pub fn macro_average(classes: &[ClassMetrics]) -> Self {
        let (precision, excluded_from_precision) =
            Metric::mean_of_defined(classes.iter().map(|c| &c.precision), "precision");
        let (recall, excluded_from_recall) =
            Metric::mean_of_defined(classes.iter().map(|c| &c.recall), "recall");
        let f1 = Metric::harmonic_mean(&precision, &recall);

        Self {
            precision,
            recall,
            f1,
            excluded_from_precision,
            excluded_from_recall,
        }
    }

    /// Metrics of the cell-wise sum of all class matrices.
    pub fn micro_average(classes: &[ClassMetrics]) -> Self {
        let pooled: ConfusionMatrix = classes.iter().map(|c| &c.matrix).sum();

        Self {
            precision: pooled.precision(),
            recall: pooled.recall(),
            f1: pooled.f1(),
            excluded_from_precision: 0,
            excluded_from_recall: 0,
        }
    }
}

/// The outcome of evaluating a classifier on the test partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Name of the evaluated classifier.
    pub classifier: String,

    /// Per-class metrics in ascending label order.
    pub classes: Vec<ClassMetrics>,

    pub macro_average: AveragedMetrics,
    pub micro_average: AveragedMetrics,

    /// Correctly classified test documents over all test documents.
    pub accuracy: Metric,

    pub total_test_docs: u64,
    pub correct: u64,

    /// Wall-clock time spent classifying.
    pub elapsed: Duration,

    pub generated_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Build a report from completed per-class matrices.
    pub fn from_matrices(
        classifier: impl Into<String>,
        matrices: BTreeMap<ClassLabel, ConfusionMatrix>,
        elapsed: Duration,
    ) -> Self {
        let classes: Vec<ClassMetrics> = matrices
            .into_iter()
            .map(|(class, matrix)| ClassMetrics::from_matrix(class, matrix))
            .collect();

        let correct = classes.iter().map(|c| c.matrix.true_positive).sum();
        let total_test_docs = classes.iter().map(|c| c.support).sum();

        Self {
            classifier: classifier.into(),
            macro_average: AveragedMetrics::macro_average(&classes),
            micro_average: AveragedMetrics::micro_average(&classes),
            accuracy: Metric::ratio(correct, total_test_docs, "no test documents"),
            total_test_docs,
            correct,
            classes,
            elapsed,
            generated_at: Utc::now(),
        }
    }

    /// Metrics of one class.
    pub fn class(&self, class: &str) -> Option<&ClassMetrics> {
        self.classes.iter().find(|c| c.class == class)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.class.chars().count())
            .chain(std::iter::once("Class".len()))
            .max()
            .unwrap_or(5);

        writeln!(
            f,
            "{:<width$}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}  {:>9}  {:>7}  {:>7}",
            "Class", "Support", "TP", "FP", "FN", "TN", "Precision", "Recall", "F1"
        )?;
        writeln!(f, "{}", "─".repeat(width + 78))?;

        for c in &self.classes {
            writeln!(
                f,
                "{:<width$}  {:>7}  {:>6}  {:>6}  {:>6}  {:>6}  {:>9}  {:>7}  {:>7}",
                c.class,
                c.support,
                c.matrix.true_positive,
                c.matrix.false_positive,
                c.matrix.false_negative,
                c.matrix.true_negative,
                c.precision,
                c.recall,
                c.f1
            )?;
        }
        writeln!(f, "{}", "─".repeat(width + 78))?;

        for (name, avg) in [("Macro avg", &self.macro_average), ("Micro avg", &self.micro_average)] {
            writeln!(
                f,
                "{:<w$}  {:>9}  {:>7}  {:>7}",
                name,
                avg.precision,
                avg.recall,
                avg.f1,
                w = width + 44
            )?;
        }

        let excluded = self
            .macro_average
            .excluded_from_precision
            .max(self.macro_average.excluded_from_recall);
        if excluded > 0 {
            writeln!(
                f,
                "Macro averages exclude {} class(es) without precision and {} without recall",
                self.macro_average.excluded_from_precision, self.macro_average.excluded_from_recall
            )?;
        }

        write!(
            f,
            "Accuracy: {} ({}/{}) in {:.2?}",
            self.accuracy, self.correct, self.total_test_docs, self.elapsed
        )
    }
}
