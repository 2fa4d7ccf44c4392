//! Metric values that may be undefined.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A metric value, or the reason it cannot be computed.
///
/// Zero denominators are reachable in practice (a class nobody predicted, a
/// class with no test documents), so they are reported as `Undefined`
/// instead of turning into NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Defined(f64),
    Undefined { reason: String },
}

impl Metric {
    /// `numerator / denominator`, undefined with `reason` when the denominator is zero.
    pub fn ratio(numerator: u64, denominator: u64, reason: &str) -> Self {
        if denominator == 0 {
            Metric::undefined(reason)
        } else {
            Metric::Defined(numerator as f64 / denominator as f64)
        }
    }

    pub fn undefined(reason: impl Into<String>) -> Self {
        Metric::Undefined {
            reason: reason.into(),
        }
    }

    /// Harmonic mean of two metrics (the F1 of a precision and a recall).
    pub fn harmonic_mean(a: &Metric, b: &Metric) -> Self {
        match (a, b) {
            (Metric::Defined(a), Metric::Defined(b)) => {
                if a + b == 0.0 {
                    Metric::undefined("precision and recall are both zero")
                } else {
                    Metric::Defined(2.0 * a * b / (a + b))
                }
            }
            (Metric::Undefined { reason }, _) | (_, Metric::Undefined { reason }) => {
                Metric::undefined(reason.clone())
            }
        }
    }

    /// Mean of the defined values, with the number of undefined ones left out.
    pub fn mean_of_defined<'a, I>(metrics: I, what: &str) -> (Self, usize)
    where
        I: IntoIterator<Item = &'a Metric>,
    {
        let mut sum = 0.0;
        let mut defined = 0usize;
        let mut excluded = 0usize;
        for metric in metrics {
            match metric {
                Metric::Defined(v) => {
                    sum += v;
                    defined += 1;
                }
                Metric::Undefined { .. } => excluded += 1,
            }
        }

        if defined == 0 {
            (Metric::undefined(format!("no class has a defined {what}")), excluded)
        } else {
            (Metric::Defined(sum / defined as f64), excluded)
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Metric::Defined(v) => Some(*v),
            Metric::Undefined { .. } => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Metric::Defined(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Metric::Defined(v) => format!("{v:.prec$}", prec = f.precision().unwrap_or(4)),
            Metric::Undefined { .. } => "n/a".to_string(),
        };
        match f.width() {
            Some(width) => write!(f, "{text:>width$}"),
            None => f.write_str(&text),
        }
    }
}
