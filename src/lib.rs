//! # corpus-bayes
//!
//! Multinomial Naive Bayes text classification over corpora laid out as one
//! directory per class, with one document per file and one token per line.
//!
//! ## Pipeline
//!
//! - Random train/test split of every class's documents
//! - Parallel map/combine word-frequency and document-count aggregation
//! - Model building with log priors and add-one smoothed likelihoods
//! - Classification by maximum posterior log-score
//! - Evaluation with per-class confusion matrices and macro/micro averages
//! - Checksummed binary model persistence
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use corpus_bayes::pipeline::{PipelineConfig, TrainingPipeline};
//! use corpus_bayes::storage::{FileStorage, Storage, StorageConfig};
//!
//! # fn main() -> corpus_bayes::error::Result<()> {
//! let corpus: Arc<dyn Storage> = Arc::new(FileStorage::new("reuters", StorageConfig::default())?);
//! let output: Arc<dyn Storage> = Arc::new(FileStorage::new("out", StorageConfig::default())?);
//!
//! let pipeline = TrainingPipeline::new(PipelineConfig::default(), corpus, "", output, "")?;
//! let outcome = pipeline.run()?;
//! if let Some(report) = outcome.report {
//!     println!("{report}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod analysis;
pub mod classifier;
pub mod cli;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod pipeline;
pub mod storage;

pub mod prelude {
    pub use crate::classifier::{DocumentClassifier, MultinomialClassifier, Prediction};
    pub use crate::corpus::{ClassLabel, CorpusSplit, CorpusSplitter, SplitConfig};
    pub use crate::error::{CorpusBayesError, Result};
    pub use crate::evaluation::{EvaluationReport, Evaluator, Metric};
    pub use crate::model::{ModelBuilder, NaiveBayesModel, load_model, save_model};
    pub use crate::pipeline::{PipelineConfig, TrainingPipeline};
    pub use crate::storage::{FileStorage, MemoryStorage, Storage, StorageConfig};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
