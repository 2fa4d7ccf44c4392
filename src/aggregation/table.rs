//! Per-class word frequency tables.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Token counts produced by one map task before they are combined.
pub type PartialCounts = AHashMap<String, u64>;

/// Token → occurrence count for one class.
///
/// Tokens are case-sensitive and compared literally. The running total always
/// equals the sum of all counts in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequencyTable {
    counts: BTreeMap<String, u64>,
    total: u64,
}

impl WordFrequencyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from explicit counts.
    pub fn from_counts(counts: BTreeMap<String, u64>) -> Self {
        let total = counts.values().sum();
        Self { counts, total }
    }

    /// Add `count` occurrences of `token`.
    pub fn add(&mut self, token: &str, count: u64) {
        if let Some(existing) = self.counts.get_mut(token) {
            *existing += count;
        } else {
            self.counts.insert(token.to_string(), count);
        }
        self.total += count;
    }

    /// Merge a map task's partial counts into this table.
    pub fn merge_partial(&mut self, partial: PartialCounts) {
        for (token, count) in partial {
            self.total += count;
            *self.counts.entry(token).or_insert(0) += count;
        }
    }

    /// Merge another table into this one.
    pub fn merge(&mut self, other: WordFrequencyTable) {
        for (token, count) in other.counts {
            *self.counts.entry(token).or_insert(0) += count;
        }
        self.total += other.total;
    }

    /// Occurrence count of `token` (zero when unseen).
    pub fn get(&self, token: &str) -> u64 {
        self.counts.get(token).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of distinct tokens.
    pub fn vocabulary_size(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(token, count)` pairs in token order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(t, c)| (t.as_str(), *c))
    }

    pub fn counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    pub fn into_counts(self) -> BTreeMap<String, u64> {
        self.counts
    }
}

impl FromIterator<(String, u64)> for WordFrequencyTable {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut table = WordFrequencyTable::new();
        for (token, count) in iter {
            table.add(&token, count);
        }
        table
    }
}
