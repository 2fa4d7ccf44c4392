//! Classification results.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::corpus::ClassLabel;

/// The outcome of classifying one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// The arg-max class.
    pub label: ClassLabel,

    /// Posterior log-score of every class.
    pub scores: BTreeMap<ClassLabel, f64>,
}

impl Prediction {
    /// Score of the predicted class.
    pub fn score(&self) -> f64 {
        self.scores
            .get(&self.label)
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Classes ordered by descending score; ties keep ascending label order.
    pub fn ranked(&self) -> Vec<(&ClassLabel, f64)> {
        let mut ranked: Vec<_> = self.scores.iter().map(|(c, s)| (c, *s)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.4})", self.label, self.score())
    }
}
