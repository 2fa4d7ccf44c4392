//! Classifier evaluation: confusion matrices and averaged metrics.

pub mod confusion;
pub mod evaluator;
pub mod metric;
pub mod report;

pub use confusion::*;
pub use evaluator::*;
pub use metric::*;
pub use report::*;
