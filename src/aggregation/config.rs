//! Configuration for parallel aggregation.

use serde::{Deserialize, Serialize};

use crate::error::{CorpusBayesError, Result};

/// Configuration for the aggregation thread pool and sharding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Thread pool size for parallel execution.
    /// If None, uses the number of CPU cores.
    pub thread_pool_size: Option<usize>,

    /// Maximum number of documents counted by one map task.
    pub shard_size: usize,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            thread_pool_size: None,
            shard_size: 64,
        }
    }
}

impl AggregationConfig {
    /// Set the thread pool size.
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }

    /// Set the shard size.
    pub fn with_shard_size(mut self, size: usize) -> Self {
        self.shard_size = size;
        self
    }

    /// Effective number of worker threads.
    pub fn effective_threads(&self) -> usize {
        self.thread_pool_size.unwrap_or_else(num_cpus::get)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.shard_size == 0 {
            return Err(CorpusBayesError::invalid_config(
                "shard_size must be greater than zero",
            ));
        }
        if self.thread_pool_size == Some(0) {
            return Err(CorpusBayesError::invalid_config(
                "thread_pool_size must be greater than zero",
            ));
        }
        Ok(())
    }
}
