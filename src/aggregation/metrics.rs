//! Metrics collected during aggregation.

use std::time::{Duration, Instant};

use log::info;
use serde::{Deserialize, Serialize};

/// Counters and timings for one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregationMetrics {
    /// Total documents read by word-count tasks.
    pub documents_read: u64,

    /// Total tokens emitted by map tasks.
    pub tokens_emitted: u64,

    /// Number of map tasks executed.
    pub shards_executed: u64,

    /// Malformed intermediate lines skipped while reading counts back.
    pub malformed_lines: u64,

    /// Time spent counting documents per class.
    pub document_count_time: Duration,

    /// Time spent counting words.
    pub word_count_time: Duration,

    /// Time spent writing and reading intermediate output.
    pub io_time: Duration,
}

impl AggregationMetrics {
    /// Create empty metrics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed word-count shard.
    pub fn record_shard(&mut self, documents: u64, tokens: u64) {
        self.shards_executed += 1;
        self.documents_read += documents;
        self.tokens_emitted += tokens;
    }

    /// Record skipped malformed lines.
    pub fn record_malformed(&mut self, lines: u64) {
        self.malformed_lines += lines;
    }

    /// Add the counters of `other` to this one.
    pub fn merge(&mut self, other: &AggregationMetrics) {
        self.documents_read += other.documents_read;
        self.tokens_emitted += other.tokens_emitted;
        self.shards_executed += other.shards_executed;
        self.malformed_lines += other.malformed_lines;
    }

    /// Total elapsed time over all phases.
    pub fn total_time(&self) -> Duration {
        self.document_count_time + self.word_count_time + self.io_time
    }

    /// Log a one-line summary at `info` level.
    pub fn log_summary(&self) {
        info!(
            "Aggregation: {} documents, {} tokens, {} shards, {} malformed lines skipped in {:.2?} \
             (doc count {:.2?}, word count {:.2?}, io {:.2?})",
            self.documents_read,
            self.tokens_emitted,
            self.shards_executed,
            self.malformed_lines,
            self.total_time(),
            self.document_count_time,
            self.word_count_time,
            self.io_time,
        );
    }
}

/// Utility for timing phases.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return elapsed time.
    pub fn stop(self) -> Duration {
        self.start.elapsed()
    }
}
