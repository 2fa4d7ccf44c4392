//! Random train/test partitioning of a class-per-directory corpus.

use std::collections::BTreeMap;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::corpus::document::{ClassLabel, DocumentRef};
use crate::error::{CorpusBayesError, Result};
use crate::storage::{Storage, join_path};

/// Configuration for the train/test split.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// A document goes to the train set when its uniform draw exceeds this value.
    pub test_threshold: f64,

    /// Seed for a reproducible split. `None` draws from the thread RNG, so
    /// every run produces a different partition.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_threshold: 0.1,
            seed: None,
        }
    }
}

impl SplitConfig {
    /// Set a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the test threshold.
    pub fn with_test_threshold(mut self, threshold: f64) -> Self {
        self.test_threshold = threshold;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.test_threshold) {
            return Err(CorpusBayesError::invalid_config(format!(
                "test_threshold must be within [0, 1], got {}",
                self.test_threshold
            )));
        }
        Ok(())
    }
}

/// The train and test document names of every class.
///
/// Produced once by [`CorpusSplitter`] and immutable afterwards. Both maps
/// always hold the same set of classes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusSplit {
    train: BTreeMap<ClassLabel, Vec<String>>,
    test: BTreeMap<ClassLabel, Vec<String>>,
}

impl CorpusSplit {
    /// Build a split from explicit train and test lists.
    ///
    /// A class present in only one map gets an empty list in the other.
    pub fn from_parts(
        mut train: BTreeMap<ClassLabel, Vec<String>>,
        mut test: BTreeMap<ClassLabel, Vec<String>>,
    ) -> Self {
        for class in train.keys() {
            test.entry(class.clone()).or_default();
        }
        for class in test.keys() {
            train.entry(class.clone()).or_default();
        }
        Self { train, test }
    }

    /// Class labels in ascending order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassLabel> {
        self.train.keys()
    }

    /// Number of classes.
    pub fn num_classes(&self) -> usize {
        self.train.len()
    }

    /// Train document names per class.
    pub fn train(&self) -> &BTreeMap<ClassLabel, Vec<String>> {
        &self.train
    }

    /// Test document names per class.
    pub fn test(&self) -> &BTreeMap<ClassLabel, Vec<String>> {
        &self.test
    }

    /// Train document names of one class (empty for unknown classes).
    pub fn train_docs(&self, class: &str) -> &[String] {
        self.train.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Test document names of one class (empty for unknown classes).
    pub fn test_docs(&self, class: &str) -> &[String] {
        self.test.get(class).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of train documents across all classes.
    pub fn total_train_docs(&self) -> usize {
        self.train.values().map(Vec::len).sum()
    }

    /// Total number of test documents across all classes.
    pub fn total_test_docs(&self) -> usize {
        self.test.values().map(Vec::len).sum()
    }

    /// All test documents, grouped by class in ascending label order.
    pub fn test_refs(&self) -> Vec<DocumentRef> {
        self.test
            .iter()
            .flat_map(|(class, docs)| docs.iter().map(move |d| DocumentRef::new(class.clone(), d.clone())))
            .collect()
    }

    /// Decompose into the train and test maps.
    pub fn into_parts(
        self,
    ) -> (
        BTreeMap<ClassLabel, Vec<String>>,
        BTreeMap<ClassLabel, Vec<String>>,
    ) {
        (self.train, self.test)
    }
}

/// Partitions each class's documents into train and test sets by random sampling.
#[derive(Debug, Clone, Default)]
pub struct CorpusSplitter {
    config: SplitConfig,
}

impl CorpusSplitter {
    /// Create a new splitter.
    pub fn new(config: SplitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// List the classes under `dataset_root` and the documents of each class.
    ///
    /// Every directory directly under the root is a class; every file inside a
    /// class directory is a document. Stray files at the root and nested
    /// directories inside a class are skipped with a warning.
    pub fn discover(
        storage: &dyn Storage,
        dataset_root: &str,
    ) -> Result<BTreeMap<ClassLabel, Vec<String>>> {
        let mut listing = BTreeMap::new();

        for class in storage.list(dataset_root)? {
            let class_dir = join_path(dataset_root, &class);
            if !storage.is_dir(&class_dir) {
                warn!("Skipping {class_dir}: not a class directory");
                continue;
            }

            let mut documents = Vec::new();
            for name in storage.list(&class_dir)? {
                let path = join_path(&class_dir, &name);
                if storage.is_dir(&path) {
                    warn!("Skipping nested directory {path}");
                    continue;
                }
                documents.push(name);
            }

            debug!("Class {class}: {} documents", documents.len());
            listing.insert(class, documents);
        }

        if listing.is_empty() {
            return Err(CorpusBayesError::invalid_argument(format!(
                "No class directories found under '{dataset_root}'"
            )));
        }

        Ok(listing)
    }

    /// Split a class → documents listing, using the configured randomness.
    pub fn split(&self, listing: &BTreeMap<ClassLabel, Vec<String>>) -> CorpusSplit {
        match self.config.seed {
            Some(seed) => self.split_with_rng(listing, &mut StdRng::seed_from_u64(seed)),
            None => self.split_with_rng(listing, &mut rand::rng()),
        }
    }

    /// Split using an explicit random source.
    ///
    /// Classes and documents are visited in the order of `listing`, so a
    /// seeded source yields the same partition for the same listing.
    pub fn split_with_rng<R: Rng + ?Sized>(
        &self,
        listing: &BTreeMap<ClassLabel, Vec<String>>,
        rng: &mut R,
    ) -> CorpusSplit {
        let mut train = BTreeMap::new();
        let mut test = BTreeMap::new();

        for (class, documents) in listing {
            let mut train_docs = Vec::new();
            let mut test_docs = Vec::new();
            for doc in documents {
                if rng.random::<f64>() > self.config.test_threshold {
                    train_docs.push(doc.clone());
                } else {
                    test_docs.push(doc.clone());
                }
            }
            train.insert(class.clone(), train_docs);
            test.insert(class.clone(), test_docs);
        }

        let split = CorpusSplit { train, test };
        info!(
            "Split {} classes into {} train and {} test documents",
            split.num_classes(),
            split.total_train_docs(),
            split.total_test_docs()
        );
        split
    }

    /// Discover the corpus under `dataset_root` and split it.
    pub fn split_storage(&self, storage: &dyn Storage, dataset_root: &str) -> Result<CorpusSplit> {
        let listing = Self::discover(storage, dataset_root)?;
        Ok(self.split(&listing))
    }
}
