//! Per-class word-frequency and document-count aggregation.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};

use crate::aggregation::config::AggregationConfig;
use crate::aggregation::executor::ParallelExecutor;
use crate::aggregation::metrics::{AggregationMetrics, Timer};
use crate::aggregation::part_file::{DOC_COUNTS_DIR, read_part_files, write_part_file};
use crate::aggregation::table::WordFrequencyTable;
use crate::aggregation::tasks::{DocumentCountTask, ShardCounts, WordCountTask};
use crate::analysis::DocumentReader;
use crate::corpus::{ClassLabel, CorpusSplit, DocumentRef};
use crate::error::{CorpusBayesError, Result};
use crate::storage::{Storage, is_within, join_path};

/// Everything the model builder needs from aggregation.
#[derive(Debug, Clone, Default)]
pub struct AggregationOutput {
    /// Class → number of train documents.
    pub document_counts: BTreeMap<ClassLabel, u64>,

    /// Class → token frequency table.
    pub word_counts: BTreeMap<ClassLabel, WordFrequencyTable>,

    pub metrics: AggregationMetrics,
}

/// Drives the map/combine jobs over a split corpus.
#[derive(Debug)]
pub struct FrequencyAggregator {
    config: AggregationConfig,
    executor: ParallelExecutor,
    reader: DocumentReader,
    reserved_names: Vec<String>,
}

impl FrequencyAggregator {
    /// Create an aggregator with its own thread pool.
    pub fn new(config: AggregationConfig) -> Result<Self> {
        let executor = ParallelExecutor::new(&config)?;
        Ok(Self {
            config,
            executor,
            reader: DocumentReader::default(),
            reserved_names: Vec::new(),
        })
    }

    /// Reserve an entry name of the output root, e.g. the saved model's file name.
    ///
    /// [`run`](Self::run) rejects a class with this name, since its count
    /// directory would take the same path.
    pub fn with_reserved_name(mut self, name: impl Into<String>) -> Self {
        self.reserved_names.push(name.into());
        self
    }

    /// Use a different document reader.
    pub fn with_reader(mut self, reader: DocumentReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &AggregationConfig {
        &self.config
    }

    /// Count the train documents of every class, one task per class.
    pub fn count_documents(
        &self,
        storage: Arc<dyn Storage>,
        dataset_root: &str,
        split: &CorpusSplit,
    ) -> Result<BTreeMap<ClassLabel, u64>> {
        let tasks: Vec<DocumentCountTask> = split
            .train()
            .iter()
            .map(|(class, docs)| DocumentCountTask::new(class, train_paths(dataset_root, class, docs)))
            .collect();

        self.executor
            .execute(storage, tasks, BTreeMap::new(), |counts, result| {
                counts.insert(result.class, result.documents);
                Ok(())
            })
    }

    /// Count token occurrences over the train documents of one class.
    ///
    /// Documents are sharded by `shard_size`; any shard failure fails the class.
    pub fn count_words(
        &self,
        storage: Arc<dyn Storage>,
        dataset_root: &str,
        class: &str,
        documents: &[String],
        metrics: &mut AggregationMetrics,
    ) -> Result<WordFrequencyTable> {
        let paths = train_paths(dataset_root, class, documents);
        let tasks: Vec<WordCountTask> = paths
            .chunks(self.config.shard_size)
            .enumerate()
            .map(|(shard, chunk)| WordCountTask::new(class, shard, chunk.to_vec(), self.reader.clone()))
            .collect();
        debug!("Class {class}: {} documents in {} shards", documents.len(), tasks.len());

        let (table, shard_metrics) = self
            .executor
            .execute(
                storage,
                tasks,
                (WordFrequencyTable::new(), AggregationMetrics::new()),
                |(table, shard_metrics), shard: ShardCounts| {
                    shard_metrics.record_shard(shard.documents, shard.tokens);
                    table.merge_partial(shard.counts);
                    Ok(())
                },
            )
            .map_err(|e| {
                CorpusBayesError::aggregation(format!("Word count for class {class} failed: {e}"))
            })?;

        metrics.merge(&shard_metrics);
        Ok(table)
    }

    /// Aggregate the whole split in memory.
    pub fn aggregate(
        &self,
        storage: Arc<dyn Storage>,
        dataset_root: &str,
        split: &CorpusSplit,
    ) -> Result<AggregationOutput> {
        let mut output = AggregationOutput::default();

        let timer = Timer::start();
        output.document_counts = self.count_documents(Arc::clone(&storage), dataset_root, split)?;
        output.metrics.document_count_time = timer.stop();

        let timer = Timer::start();
        for (class, docs) in split.train() {
            let table = self.count_words(
                Arc::clone(&storage),
                dataset_root,
                class,
                docs,
                &mut output.metrics,
            )?;
            output.word_counts.insert(class.clone(), table);
        }
        output.metrics.word_count_time = timer.stop();

        Ok(output)
    }

    /// Aggregate the split and materialise the counts under `output_root`.
    ///
    /// Documents are read from `corpus`; counts are written to `output`, which
    /// may be the same storage. The output root is cleared first. Per-class counts land in
    /// `<output_root>/<class>/part-r-00000` and document counts in
    /// `<output_root>/_doc_counts/part-r-00000`. The returned counts are the
    /// ones read back from those files.
    pub fn run(
        &self,
        corpus: Arc<dyn Storage>,
        dataset_root: &str,
        output: &dyn Storage,
        output_root: &str,
        split: &CorpusSplit,
    ) -> Result<AggregationOutput> {
        if split.classes().any(|c| c.starts_with('_')) {
            return Err(CorpusBayesError::invalid_argument(
                "Class names starting with '_' are reserved for intermediate output",
            ));
        }
        if let Some(class) = split
            .classes()
            .find(|c| self.reserved_names.iter().any(|name| name == *c))
        {
            return Err(CorpusBayesError::invalid_argument(format!(
                "Class name '{class}' collides with a reserved output entry"
            )));
        }
        check_output_location(corpus.as_ref(), dataset_root, output, output_root)?;

        clear_directory(output, output_root)?;

        let mut result = self.aggregate(corpus, dataset_root, split)?;

        let timer = Timer::start();
        write_part_file(
            output,
            &join_path(output_root, DOC_COUNTS_DIR),
            result.document_counts.iter().map(|(c, n)| (c.as_str(), *n)),
        )?;
        for (class, table) in &result.word_counts {
            write_part_file(output, &join_path(output_root, class), table.iter())?;
        }

        let (document_counts, word_counts, malformed) = read_aggregated_output(output, output_root)?;
        result.document_counts = document_counts;
        result.word_counts = word_counts;
        result.metrics.record_malformed(malformed);
        result.metrics.io_time = timer.stop();

        result.metrics.log_summary();
        Ok(result)
    }
}

/// Read the intermediate output written by [`FrequencyAggregator::run`].
///
/// Every directory under `output_root` that does not start with `_` is a
/// class. Returns document counts, word-frequency tables and the number of
/// malformed lines skipped.
pub fn read_aggregated_output(
    storage: &dyn Storage,
    output_root: &str,
) -> Result<(
    BTreeMap<ClassLabel, u64>,
    BTreeMap<ClassLabel, WordFrequencyTable>,
    u64,
)> {
    let doc_counts = read_part_files(storage, &join_path(output_root, DOC_COUNTS_DIR))?;
    let mut malformed = doc_counts.malformed_lines;

    let mut word_counts = BTreeMap::new();
    for name in storage.list(output_root)? {
        let dir = join_path(output_root, &name);
        if name.starts_with('_') || !storage.is_dir(&dir) {
            continue;
        }
        let contents = read_part_files(storage, &dir)?;
        malformed += contents.malformed_lines;
        word_counts.insert(name, WordFrequencyTable::from_counts(contents.counts));
    }

    Ok((doc_counts.counts, word_counts, malformed))
}

/// Reject an output root that would clear the corpus, or that lies inside it.
///
/// Only applies when both handles are the same storage.
pub fn check_output_location(
    corpus: &dyn Storage,
    dataset_root: &str,
    output: &dyn Storage,
    output_root: &str,
) -> Result<()> {
    if !std::ptr::addr_eq(corpus, output) {
        return Ok(());
    }
    if is_within(dataset_root, output_root) {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Output root '{output_root}' contains the dataset root '{dataset_root}'"
        )));
    }
    if is_within(output_root, dataset_root) {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Output root '{output_root}' is inside the dataset root '{dataset_root}'"
        )));
    }
    Ok(())
}

/// Remove everything below `dir`, creating it when missing.
pub fn clear_directory(storage: &dyn Storage, dir: &str) -> Result<()> {
    if !storage.exists(dir) {
        return storage.create_dir(dir);
    }
    if !storage.is_dir(dir) {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Output path '{dir}' is not a directory"
        )));
    }

    info!("Clearing output directory '{dir}'");
    for name in storage.list(dir)? {
        storage.delete(&join_path(dir, &name), true)?;
    }
    storage.create_dir(dir)
}

fn train_paths(dataset_root: &str, class: &str, documents: &[String]) -> Vec<String> {
    documents
        .iter()
        .map(|doc| DocumentRef::new(class, doc.as_str()).path(dataset_root))
        .collect()
}
