use corpus_bayes::aggregation::{DOC_COUNTS_DIR, PART_FILE_NAME, read_aggregated_output};
use corpus_bayes::classifier::{DocumentClassifier, MultinomialClassifier};
use corpus_bayes::error::Result;
use corpus_bayes::model::load_model;
use corpus_bayes::pipeline::{PipelineConfig, TrainingPipeline};
use corpus_bayes::storage::{FileStorage, Storage, StorageConfig};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const CORPUS: [(&str, &[&str]); 3] = [
    ("grain", &["wheat", "corn", "tonnes", "harvest", "crop"]),
    ("money", &["rate", "bank", "dollar", "interest", "yen"]),
    ("ship", &["port", "vessel", "cargo", "tanker", "strike"]),
];

/// Write a class-per-directory corpus: one file per document, one token per line.
fn write_corpus(root: &Path, docs_per_class: usize) -> Result<()> {
    for (class, words) in CORPUS {
        let dir = root.join(class);
        fs::create_dir_all(&dir)?;
        for i in 0..docs_per_class {
            let tokens: Vec<&str> = (0..8).map(|j| words[(i + j * 3) % words.len()]).collect();
            fs::write(dir.join(format!("{i:04}")), tokens.join("\n") + "\n")?;
        }
    }
    Ok(())
}

fn open(dir: &Path) -> Result<Arc<dyn Storage>> {
    Ok(Arc::new(FileStorage::new(dir, StorageConfig::default())?))
}

fn config(seed: u64) -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.split = config.split.with_seed(seed).with_test_threshold(0.3);
    config.aggregation = config.aggregation.with_thread_pool_size(3).with_shard_size(5);
    config
}

#[test]
fn test_train_save_and_evaluate_on_disk() -> Result<()> {
    let temp = TempDir::new()?;
    let data_dir = temp.path().join("data");
    let out_dir = temp.path().join("out");
    write_corpus(&data_dir, 30)?;

    let output = open(&out_dir)?;
    let pipeline = TrainingPipeline::new(config(17), open(&data_dir)?, "", output.clone(), "")?;
    let outcome = pipeline.run()?;
    let model = outcome.model;

    // Every document lands in exactly one partition.
    assert_eq!(model.num_classes(), 3);
    assert_eq!(model.total_train_docs() + model.total_test_docs(), 90);
    for (class, _) in CORPUS {
        let mut all: Vec<String> = model.train_docs(class).to_vec();
        all.extend(model.test_docs(class).iter().cloned());
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 30, "class {class}");
    }

    // Intermediate counts are materialised per class.
    for (class, _) in CORPUS {
        assert!(out_dir.join(class).join(PART_FILE_NAME).is_file());
    }
    assert!(out_dir.join(DOC_COUNTS_DIR).join(PART_FILE_NAME).is_file());

    let (doc_counts, word_counts, malformed) = read_aggregated_output(output.as_ref(), "")?;
    assert_eq!(malformed, 0);
    for (class, _) in CORPUS {
        assert_eq!(doc_counts[class], model.train_docs(class).len() as u64);
        assert_eq!(word_counts[class].total(), model.total_words(class));
        // Eight tokens per training document.
        assert_eq!(model.total_words(class), 8 * model.train_docs(class).len() as u64);
    }

    // The saved model round-trips.
    assert!(out_dir.join("Classifier").is_file());
    let loaded = load_model(output.as_ref(), "Classifier")?;
    assert_eq!(loaded, *model);

    // Disjoint vocabularies classify perfectly; matrices cover every test document.
    let report = outcome.report.expect("evaluation enabled");
    assert_eq!(report.total_test_docs, model.total_test_docs());
    assert_eq!(report.correct, report.total_test_docs);
    for class in &report.classes {
        let m = &class.matrix;
        assert_eq!(
            m.true_positive + m.false_positive + m.false_negative + m.true_negative,
            report.total_test_docs
        );
    }

    Ok(())
}

#[test]
fn test_evaluate_saved_model_in_new_pipeline() -> Result<()> {
    let temp = TempDir::new()?;
    let data_dir = temp.path().join("data");
    let out_dir = temp.path().join("out");
    write_corpus(&data_dir, 20)?;

    let mut train_config = config(3);
    train_config.evaluate = false;
    let trained = TrainingPipeline::new(train_config, open(&data_dir)?, "", open(&out_dir)?, "")?.run()?;
    assert!(trained.report.is_none());

    // A different seed must not matter: evaluation uses the stored partition.
    let pipeline = TrainingPipeline::new(config(99), open(&data_dir)?, "", open(&out_dir)?, "")?;
    let report = pipeline.evaluate_saved()?;
    assert_eq!(report.total_test_docs, trained.model.total_test_docs());

    let classifier = MultinomialClassifier::new(Arc::new(pipeline.load()?));
    let data = open(&data_dir)?;
    let prediction = classifier.classify_document(data.as_ref(), "ship/0000")?;
    assert_eq!(prediction.label, "ship");

    Ok(())
}

#[test]
fn test_rerun_clears_stale_output() -> Result<()> {
    let temp = TempDir::new()?;
    let data_dir = temp.path().join("data");
    let out_dir = temp.path().join("out");
    write_corpus(&data_dir, 10)?;

    fs::create_dir_all(out_dir.join("stale"))?;
    fs::write(out_dir.join("stale").join(PART_FILE_NAME), "ghost\t5\n")?;

    let pipeline = TrainingPipeline::new(config(1), open(&data_dir)?, "", open(&out_dir)?, "")?;
    let outcome = pipeline.run()?;

    assert!(!out_dir.join("stale").exists());
    assert!(!outcome.model.contains_class("stale"));

    Ok(())
}

#[test]
fn test_corrupted_model_is_rejected() -> Result<()> {
    let temp = TempDir::new()?;
    let data_dir = temp.path().join("data");
    let out_dir = temp.path().join("out");
    write_corpus(&data_dir, 10)?;

    let output = open(&out_dir)?;
    let mut pipeline_config = config(5);
    pipeline_config.evaluate = false;
    TrainingPipeline::new(pipeline_config, open(&data_dir)?, "", output.clone(), "")?.run()?;

    let path = out_dir.join("Classifier");
    let mut bytes = fs::read(&path)?;
    let middle = bytes.len() / 2;
    bytes[middle] ^= 0xFF;
    fs::write(&path, &bytes)?;
    assert!(load_model(output.as_ref(), "Classifier").is_err());

    fs::write(&path, &bytes[..10])?;
    assert!(load_model(output.as_ref(), "Classifier").is_err());

    Ok(())
}

#[test]
fn test_empty_dataset_is_error() -> Result<()> {
    let temp = TempDir::new()?;
    let data_dir = temp.path().join("data");
    fs::create_dir_all(&data_dir)?;

    let pipeline = TrainingPipeline::new(
        config(1),
        open(&data_dir)?,
        "",
        open(&temp.path().join("out"))?,
        "",
    )?;
    assert!(pipeline.run().is_err());

    Ok(())
}
