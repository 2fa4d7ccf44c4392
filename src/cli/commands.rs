//! Command implementations for the corpus-bayes CLI.

use std::path::Path;
use std::sync::Arc;

use log::{debug, info};

use crate::cli::args::*;
use crate::cli::output::*;
use crate::error::{CorpusBayesError, Result};
use crate::pipeline::{PipelineConfig, TrainingPipeline};
use crate::storage::{FileStorage, Storage};

/// Execute the CLI.
///
/// Anything other than exactly two positional arguments prints the usage line
/// and succeeds without doing any work.
pub fn execute_command(args: CorpusBayesArgs) -> Result<()> {
    let Some((data_dir, output_dir)) = args.directories() else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = build_config(&args)?;
    let pipeline = open_pipeline(data_dir, output_dir, config)?;

    if args.eval_only {
        evaluate_saved(&pipeline, &args)
    } else {
        train(&pipeline, &args)
    }
}

/// Load the configuration file, if any, and apply flag overrides.
pub fn build_config(args: &CorpusBayesArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            PipelineConfig::load(path)?
        }
        None => PipelineConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.split.seed = Some(seed);
    }
    if let Some(threshold) = args.test_threshold {
        config.split.test_threshold = threshold;
    }
    if let Some(threads) = args.threads {
        config.aggregation.thread_pool_size = Some(threads);
    }
    if args.skip_eval {
        config.evaluate = false;
    }

    config.validate()?;
    Ok(config)
}

fn open_pipeline(data_dir: &Path, output_dir: &Path, config: PipelineConfig) -> Result<TrainingPipeline> {
    if !data_dir.is_dir() {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Dataset directory does not exist: {}",
            data_dir.display()
        )));
    }
    check_disjoint(data_dir, output_dir)?;

    let corpus: Arc<dyn Storage> = Arc::new(FileStorage::new(data_dir, config.storage.clone())?);
    let output: Arc<dyn Storage> = Arc::new(FileStorage::new(output_dir, config.storage.clone())?);
    TrainingPipeline::new(config, corpus, "", output, "")
}

/// The output directory is cleared on every run, so it must not contain the dataset.
fn check_disjoint(data_dir: &Path, output_dir: &Path) -> Result<()> {
    let data = data_dir.canonicalize()?;
    let output = match output_dir.canonicalize() {
        Ok(path) => path,
        // Not created yet, so it cannot contain the dataset.
        Err(_) => return Ok(()),
    };

    if data.starts_with(&output) {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Output directory {} contains the dataset directory {}",
            output_dir.display(),
            data_dir.display()
        )));
    }
    if output.starts_with(&data) {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Output directory {} is inside the dataset directory {}",
            output_dir.display(),
            data_dir.display()
        )));
    }
    Ok(())
}

/// Train, save and optionally evaluate.
fn train(pipeline: &TrainingPipeline, args: &CorpusBayesArgs) -> Result<()> {
    let outcome = pipeline.run()?;
    info!("Model saved to {}", pipeline.model_path());

    let summary = RunSummary::new(
        pipeline.model_path(),
        &outcome.model,
        Some(outcome.metrics),
        outcome.report,
    );
    output_result("Training completed", &summary, args)
}

/// Evaluate the model saved by an earlier run on its stored test partition.
fn evaluate_saved(pipeline: &TrainingPipeline, args: &CorpusBayesArgs) -> Result<()> {
    let model = Arc::new(pipeline.load()?);
    let report = pipeline.evaluate(Arc::clone(&model))?;

    let summary = RunSummary::new(pipeline.model_path(), &model, None, Some(report));
    output_result("Evaluation completed", &summary, args)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use tempfile::TempDir;

    use super::*;

    fn parse(argv: &[&str]) -> CorpusBayesArgs {
        CorpusBayesArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_usage_is_not_an_error() {
        assert!(execute_command(parse(&["corpus-bayes"])).is_ok());
        assert!(execute_command(parse(&["corpus-bayes", "a", "b", "c"])).is_ok());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"split": {"test_threshold": 0.3, "seed": 1}, "aggregation": {"shard_size": 8}}"#,
        )
        .unwrap();
        let path = path.to_string_lossy().to_string();

        let config = build_config(&parse(&["corpus-bayes", "--config", &path, "--seed", "42"])).unwrap();
        assert_eq!(config.split.seed, Some(42));
        assert_eq!(config.split.test_threshold, 0.3);
        assert_eq!(config.aggregation.shard_size, 8);
        assert!(config.evaluate);

        let config = build_config(&parse(&["corpus-bayes", "--skip-eval", "--test-threshold", "0.5"])).unwrap();
        assert!(!config.evaluate);
        assert_eq!(config.split.test_threshold, 0.5);
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        assert!(build_config(&parse(&["corpus-bayes", "--test-threshold", "1.5"])).is_err());
        assert!(build_config(&parse(&["corpus-bayes", "--threads", "0"])).is_err());
    }

    #[test]
    fn test_missing_dataset_is_error() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("missing");
        let out = dir.path().join("out");
        let args = parse(&[
            "corpus-bayes",
            "-q",
            &data.to_string_lossy(),
            &out.to_string_lossy(),
        ]);
        assert!(execute_command(args).is_err());
    }

    #[test]
    fn test_output_must_not_contain_dataset() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(data.join("A")).unwrap();

        assert!(check_disjoint(&data, dir.path()).is_err());
        assert!(check_disjoint(&data, &data.join("out")).is_ok());
        std::fs::create_dir_all(data.join("out")).unwrap();
        assert!(check_disjoint(&data, &data.join("out")).is_err());
        assert!(check_disjoint(&data, &dir.path().join("out")).is_ok());
    }
}
