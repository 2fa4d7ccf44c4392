//! One-vs-rest confusion matrices.

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::corpus::ClassLabel;
use crate::error::{CorpusBayesError, Result};
use crate::evaluation::metric::Metric;

/// The 2×2 confusion matrix of one class treated as "positive" against the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: u64,
    pub false_positive: u64,
    pub false_negative: u64,
    pub true_negative: u64,
}

impl ConfusionMatrix {
    pub fn new(true_positive: u64, false_positive: u64, false_negative: u64, true_negative: u64) -> Self {
        Self {
            true_positive,
            false_positive,
            false_negative,
            true_negative,
        }
    }

    /// Sum of all four cells.
    pub fn total(&self) -> u64 {
        self.true_positive + self.false_positive + self.false_negative + self.true_negative
    }

    /// `tp / (tp + fp)`; undefined when the class was never predicted.
    pub fn precision(&self) -> Metric {
        Metric::ratio(
            self.true_positive,
            self.true_positive + self.false_positive,
            "class was never predicted",
        )
    }

    /// `tp / (tp + fn)`; undefined when the class has no test documents.
    pub fn recall(&self) -> Metric {
        Metric::ratio(
            self.true_positive,
            self.true_positive + self.false_negative,
            "class has no test documents",
        )
    }

    /// Harmonic mean of precision and recall.
    pub fn f1(&self) -> Metric {
        Metric::harmonic_mean(&self.precision(), &self.recall())
    }
}

impl Add for ConfusionMatrix {
    type Output = ConfusionMatrix;

    fn add(self, other: ConfusionMatrix) -> ConfusionMatrix {
        ConfusionMatrix::new(
            self.true_positive + other.true_positive,
            self.false_positive + other.false_positive,
            self.false_negative + other.false_negative,
            self.true_negative + other.true_negative,
        )
    }
}

impl AddAssign for ConfusionMatrix {
    fn add_assign(&mut self, other: ConfusionMatrix) {
        *self = *self + other;
    }
}

impl Sum for ConfusionMatrix {
    fn sum<I: Iterator<Item = ConfusionMatrix>>(iter: I) -> Self {
        iter.fold(ConfusionMatrix::default(), Add::add)
    }
}

impl<'a> Sum<&'a ConfusionMatrix> for ConfusionMatrix {
    fn sum<I: Iterator<Item = &'a ConfusionMatrix>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

/// Accumulates classification outcomes into per-class confusion matrices.
///
/// Outcomes only fill the true-positive and false-positive cells: a correct
/// prediction counts for the actual class, a wrong one counts against the
/// predicted class. [`complete`](Self::complete) derives the remaining cells
/// from the per-class and grand test-document totals.
#[derive(Debug, Clone)]
pub struct ConfusionTally {
    matrices: BTreeMap<ClassLabel, ConfusionMatrix>,
    test_counts: BTreeMap<ClassLabel, u64>,
    grand_total: u64,
    recorded: u64,
}

impl ConfusionTally {
    /// Start a tally for classes with the given test-document counts.
    pub fn new(test_counts: BTreeMap<ClassLabel, u64>) -> Self {
        let matrices = test_counts
            .keys()
            .map(|c| (c.clone(), ConfusionMatrix::default()))
            .collect();
        let grand_total = test_counts.values().sum();
        Self {
            matrices,
            test_counts,
            grand_total,
            recorded: 0,
        }
    }

    /// Record one classified document.
    pub fn record(&mut self, actual: &str, predicted: &str) -> Result<()> {
        if !self.matrices.contains_key(actual) {
            return Err(CorpusBayesError::invalid_argument(format!(
                "Unknown actual class {actual}"
            )));
        }
        let matrix = self.matrices.get_mut(predicted).ok_or_else(|| {
            CorpusBayesError::invalid_argument(format!("Unknown predicted class {predicted}"))
        })?;

        if actual == predicted {
            matrix.true_positive += 1;
        } else {
            matrix.false_positive += 1;
        }
        self.recorded += 1;
        Ok(())
    }

    /// Number of outcomes recorded so far.
    pub fn recorded(&self) -> u64 {
        self.recorded
    }

    /// Total test documents over all classes.
    pub fn grand_total(&self) -> u64 {
        self.grand_total
    }

    /// Fill in false negatives and true negatives.
    ///
    /// Every test document must have been recorded exactly once.
    pub fn complete(self) -> Result<BTreeMap<ClassLabel, ConfusionMatrix>> {
        if self.recorded != self.grand_total {
            return Err(CorpusBayesError::invalid_operation(format!(
                "Recorded {} outcomes for {} test documents",
                self.recorded, self.grand_total
            )));
        }

        let mut matrices = self.matrices;
        for (class, matrix) in matrices.iter_mut() {
            let test = self.test_counts[class];
            matrix.false_negative = test.checked_sub(matrix.true_positive).ok_or_else(|| {
                CorpusBayesError::internal(format!(
                    "Class {class} has more true positives than test documents"
                ))
            })?;
            matrix.true_negative = (self.grand_total - test)
                .checked_sub(matrix.false_positive)
                .ok_or_else(|| {
                    CorpusBayesError::internal(format!(
                        "Class {class} has more false positives than other test documents"
                    ))
                })?;
        }
        Ok(matrices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u64)]) -> BTreeMap<ClassLabel, u64> {
        pairs.iter().map(|(c, n)| (c.to_string(), *n)).collect()
    }

    #[test]
    fn test_matrix_metrics() {
        let m = ConfusionMatrix::new(5, 1, 2, 10);
        assert_eq!(m.total(), 18);
        assert!((m.precision().value().unwrap() - 5.0 / 6.0).abs() < 1e-12);
        assert!((m.recall().value().unwrap() - 5.0 / 7.0).abs() < 1e-12);
        assert!((m.f1().value().unwrap() - 10.0 / 13.0).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_metrics() {
        let never_predicted = ConfusionMatrix::new(0, 0, 3, 7);
        assert!(!never_predicted.precision().is_defined());
        assert_eq!(never_predicted.recall().value(), Some(0.0));
        assert!(!never_predicted.f1().is_defined());

        let no_tests = ConfusionMatrix::new(0, 2, 0, 8);
        assert!(!no_tests.recall().is_defined());
        assert_eq!(no_tests.precision().value(), Some(0.0));
    }

    #[test]
    fn test_sum() {
        let total: ConfusionMatrix = [
            ConfusionMatrix::new(5, 1, 2, 10),
            ConfusionMatrix::new(3, 2, 1, 12),
            ConfusionMatrix::new(4, 0, 3, 11),
        ]
        .iter()
        .sum();
        assert_eq!(total, ConfusionMatrix::new(12, 3, 6, 33));
    }

    #[test]
    fn test_tally_update_rule() {
        let mut tally = ConfusionTally::new(counts(&[("A", 3), ("B", 2), ("C", 1)]));
        tally.record("A", "A").unwrap();
        tally.record("A", "A").unwrap();
        tally.record("A", "B").unwrap();
        tally.record("B", "B").unwrap();
        tally.record("B", "A").unwrap();
        tally.record("C", "A").unwrap();

        let matrices = tally.complete().unwrap();
        assert_eq!(matrices["A"], ConfusionMatrix::new(2, 2, 1, 1));
        assert_eq!(matrices["B"], ConfusionMatrix::new(1, 1, 1, 3));
        assert_eq!(matrices["C"], ConfusionMatrix::new(0, 0, 1, 5));

        for matrix in matrices.values() {
            assert_eq!(matrix.total(), 6);
        }
    }

    #[test]
    fn test_tally_rejects_unknown_classes() {
        let mut tally = ConfusionTally::new(counts(&[("A", 1)]));
        assert!(tally.record("A", "Z").is_err());
        assert!(tally.record("Z", "A").is_err());
        assert_eq!(tally.recorded(), 0);
    }

    #[test]
    fn test_incomplete_tally() {
        let mut tally = ConfusionTally::new(counts(&[("A", 2)]));
        tally.record("A", "A").unwrap();
        assert!(tally.complete().is_err());
    }

    #[test]
    fn test_empty_tally() {
        let tally = ConfusionTally::new(counts(&[("A", 0), ("B", 0)]));
        assert_eq!(tally.grand_total(), 0);
        let matrices = tally.complete().unwrap();
        assert_eq!(matrices["A"], ConfusionMatrix::default());
    }
}
