//! End-to-end training and evaluation.
//!
//! The pipeline wires the stages together in order: split the corpus, count
//! documents and words, build the model, save it, then evaluate it on the
//! held-out documents.

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::{Deserialize, Serialize};

use crate::aggregation::{AggregationConfig, AggregationMetrics, FrequencyAggregator};
use crate::corpus::{CorpusSplit, CorpusSplitter, SplitConfig};
use crate::error::{CorpusBayesError, Result};
use crate::evaluation::{EvaluationReport, Evaluator};
use crate::model::{ModelBuilder, NaiveBayesModel, load_model, save_model};
use crate::storage::{Storage, StorageConfig, join_path};

/// Configuration of a training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Train/test split settings.
    pub split: SplitConfig,

    /// Thread pool and sharding settings.
    pub aggregation: AggregationConfig,

    /// Storage buffer settings.
    pub storage: StorageConfig,

    /// File name of the saved model inside the output directory.
    pub model_file_name: String,

    /// Whether to evaluate after training.
    pub evaluate: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            split: SplitConfig::default(),
            aggregation: AggregationConfig::default(),
            storage: StorageConfig::default(),
            model_file_name: "Classifier".to_string(),
            evaluate: true,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            CorpusBayesError::invalid_config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Validate all sections.
    pub fn validate(&self) -> Result<()> {
        self.split.validate()?;
        self.aggregation.validate()?;
        if self.model_file_name.is_empty() || self.model_file_name.contains('/') {
            return Err(CorpusBayesError::invalid_config(format!(
                "model_file_name must be a plain file name, got '{}'",
                self.model_file_name
            )));
        }
        if self.model_file_name.starts_with("part-r") {
            return Err(CorpusBayesError::invalid_config(
                "model_file_name must not look like an intermediate part file",
            ));
        }
        Ok(())
    }
}

/// What a full run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub model: Arc<NaiveBayesModel>,
    pub metrics: AggregationMetrics,
    /// `None` when evaluation is disabled.
    pub report: Option<EvaluationReport>,
}

/// Runs training and evaluation over a corpus storage and an output storage.
#[derive(Debug)]
pub struct TrainingPipeline {
    config: PipelineConfig,
    corpus: Arc<dyn Storage>,
    dataset_root: String,
    output: Arc<dyn Storage>,
    output_root: String,
}

impl TrainingPipeline {
    /// Create a pipeline reading classes below `dataset_root` of `corpus` and
    /// writing counts and the model below `output_root` of `output`.
    pub fn new(
        config: PipelineConfig,
        corpus: Arc<dyn Storage>,
        dataset_root: impl Into<String>,
        output: Arc<dyn Storage>,
        output_root: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            corpus,
            dataset_root: dataset_root.into(),
            output,
            output_root: output_root.into(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Storage path of the saved model.
    pub fn model_path(&self) -> String {
        join_path(&self.output_root, &self.config.model_file_name)
    }

    /// Discover the corpus and split it.
    pub fn split(&self) -> Result<CorpusSplit> {
        CorpusSplitter::new(self.config.split.clone())?
            .split_storage(self.corpus.as_ref(), &self.dataset_root)
    }

    /// Split, aggregate and build a model. Nothing is saved.
    pub fn train(&self) -> Result<(NaiveBayesModel, AggregationMetrics)> {
        let split = self.split()?;
        let aggregator = FrequencyAggregator::new(self.config.aggregation.clone())?
            .with_reserved_name(self.config.model_file_name.as_str());
        let output = aggregator.run(
            Arc::clone(&self.corpus),
            &self.dataset_root,
            self.output.as_ref(),
            &self.output_root,
            &split,
        )?;

        let metrics = output.metrics.clone();
        let model = ModelBuilder::new(split).with_aggregation(output).build()?;
        Ok((model, metrics))
    }

    /// Save a model at [`model_path`](Self::model_path).
    pub fn save(&self, model: &NaiveBayesModel) -> Result<()> {
        save_model(self.output.as_ref(), &self.model_path(), model)
    }

    /// Load the model saved at [`model_path`](Self::model_path).
    pub fn load(&self) -> Result<NaiveBayesModel> {
        load_model(self.output.as_ref(), &self.model_path())
    }

    /// Evaluate a model on its test partition.
    pub fn evaluate(&self, model: Arc<NaiveBayesModel>) -> Result<EvaluationReport> {
        Evaluator::new(self.config.aggregation.thread_pool_size)?.evaluate(
            self.corpus.as_ref(),
            &self.dataset_root,
            model,
        )
    }

    /// Load the saved model and evaluate it.
    pub fn evaluate_saved(&self) -> Result<EvaluationReport> {
        let model = Arc::new(self.load()?);
        self.evaluate(model)
    }

    /// Train, save and (unless disabled) evaluate.
    pub fn run(&self) -> Result<PipelineOutcome> {
        info!(
            "Training on '{}', writing to '{}'",
            self.dataset_root, self.output_root
        );
        let (model, metrics) = self.train()?;
        self.save(&model)?;

        let model = Arc::new(model);
        let report = if self.config.evaluate {
            Some(self.evaluate(Arc::clone(&model))?)
        } else {
            None
        };

        Ok(PipelineOutcome {
            model,
            metrics,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn corpus() -> Arc<MemoryStorage> {
        let storage = Arc::new(MemoryStorage::new_default());
        for i in 0..20 {
            storage
                .put(&format!("data/sports/s{i:02}"), "goal\nteam\nmatch\n")
                .unwrap();
            storage
                .put(&format!("data/trade/t{i:02}"), "tariff\nexport\ndeal\n")
                .unwrap();
        }
        storage
    }

    fn config(seed: u64) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.split = config.split.with_seed(seed);
        config.aggregation = config.aggregation.with_thread_pool_size(2).with_shard_size(4);
        config
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.model_file_name, "Classifier");
        assert!(config.evaluate);
        assert_eq!(config.split.test_threshold, 0.1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_partial_json() {
        let config = PipelineConfig::from_json(
            r#"{"split": {"test_threshold": 0.25, "seed": 3}, "evaluate": false}"#,
        )
        .unwrap();

        assert_eq!(config.split.test_threshold, 0.25);
        assert_eq!(config.split.seed, Some(3));
        assert!(!config.evaluate);
        assert_eq!(config.aggregation.shard_size, 64);
        assert_eq!(config.model_file_name, "Classifier");
    }

    #[test]
    fn test_invalid_config() {
        assert!(PipelineConfig::from_json(r#"{"split": {"test_threshold": 2.0}}"#).is_err());
        assert!(PipelineConfig::from_json(r#"{"model_file_name": "a/b"}"#).is_err());
        assert!(PipelineConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_run_trains_saves_and_evaluates() {
        let storage = corpus();
        let pipeline =
            TrainingPipeline::new(config(11), storage.clone(), "data", storage.clone(), "out").unwrap();

        let outcome = pipeline.run().unwrap();
        let model = outcome.model;

        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.total_train_docs() + model.total_test_docs(), 40);
        assert!(storage.exists("out/Classifier"));
        assert_eq!(pipeline.load().unwrap(), *model);

        let report = outcome.report.unwrap();
        assert_eq!(report.total_test_docs, model.total_test_docs());
        assert_eq!(report.correct, report.total_test_docs);
    }

    #[test]
    fn test_evaluate_saved_uses_stored_partition() {
        let storage = corpus();
        let mut config = config(5);
        config.evaluate = false;
        let pipeline =
            TrainingPipeline::new(config, storage.clone(), "data", storage.clone(), "out").unwrap();

        let outcome = pipeline.run().unwrap();
        assert!(outcome.report.is_none());

        let report = pipeline.evaluate_saved().unwrap();
        assert_eq!(report.total_test_docs, outcome.model.total_test_docs());
    }

    #[test]
    fn test_shared_storage_output_root_above_corpus_is_rejected() {
        let storage = corpus();
        let pipeline =
            TrainingPipeline::new(config(2), storage.clone(), "data", storage.clone(), "").unwrap();

        assert!(matches!(pipeline.run(), Err(CorpusBayesError::InvalidArgument(_))));
        assert!(storage.exists("data/sports/s00"));
        assert!(storage.exists("data/trade/t19"));
        assert_eq!(storage.list("data/sports").unwrap().len(), 20);
    }

    #[test]
    fn test_class_named_like_model_file_is_rejected() {
        let storage = corpus();
        storage.put("data/Classifier/c00", "model\n").unwrap();
        let pipeline =
            TrainingPipeline::new(config(4), storage.clone(), "data", storage.clone(), "out").unwrap();

        assert!(matches!(pipeline.run(), Err(CorpusBayesError::InvalidArgument(_))));
        assert!(!storage.exists("out/Classifier"));
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let storage = corpus();
        let first = TrainingPipeline::new(config(9), storage.clone(), "data", storage.clone(), "out")
            .unwrap()
            .train()
            .unwrap()
            .0;
        let second = TrainingPipeline::new(config(9), storage.clone(), "data", storage.clone(), "out")
            .unwrap()
            .train()
            .unwrap()
            .0;

        assert_eq!(first, second);
    }
}
