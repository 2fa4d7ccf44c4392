//! Error types for corpus-bayes.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`CorpusBayesError`] enum.
//!
//! # Examples
//!
//! ```
//! use corpus_bayes::error::{CorpusBayesError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(CorpusBayesError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for corpus-bayes operations.
#[derive(Error, Debug)]
pub enum CorpusBayesError {
    /// I/O errors while reading documents or writing results.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Storage-related errors (missing paths, closed storage, ...).
    #[error("Storage error: {0}")]
    Storage(String),

    /// A parallel aggregation task failed; the class it belonged to is not trained.
    #[error("Aggregation error: {0}")]
    Aggregation(String),

    /// The model is inconsistent, empty or could not be reconstructed.
    #[error("Model error: {0}")]
    Model(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with CorpusBayesError.
pub type Result<T> = std::result::Result<T, CorpusBayesError>;

impl CorpusBayesError {
    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Storage(msg.into())
    }

    /// Create a new aggregation error.
    pub fn aggregation<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Aggregation(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Model(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Serialization(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::InvalidOperation(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Other(format!("Internal error: {}", msg.into()))
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        CorpusBayesError::Other(msg.into())
    }
}

impl From<bincode::Error> for CorpusBayesError {
    fn from(err: bincode::Error) -> Self {
        CorpusBayesError::Serialization(err.to_string())
    }
}
