//! Output formatting for CLI commands.

use serde::{Deserialize, Serialize};

use crate::aggregation::AggregationMetrics;
use crate::cli::args::{CorpusBayesArgs, OutputFormat};
use crate::corpus::ClassLabel;
use crate::error::Result;
use crate::evaluation::EvaluationReport;
use crate::model::NaiveBayesModel;

/// Per-class summary of a trained model.
#[derive(Debug, Serialize, Deserialize)]
pub struct ClassSummary {
    pub class: ClassLabel,
    pub train_docs: usize,
    pub test_docs: usize,
    pub prior: f64,
    pub vocabulary_size: usize,
    pub total_words: u64,
}

/// Result of a training and/or evaluation run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub model_path: String,
    pub classes: Vec<ClassSummary>,
    pub total_train_docs: u64,
    pub total_test_docs: u64,
    /// Present when the model was trained in this run.
    pub aggregation: Option<AggregationMetrics>,
    /// Present when the model was evaluated in this run.
    pub evaluation: Option<EvaluationReport>,
}

impl RunSummary {
    pub fn new(
        model_path: impl Into<String>,
        model: &NaiveBayesModel,
        aggregation: Option<AggregationMetrics>,
        evaluation: Option<EvaluationReport>,
    ) -> Self {
        let classes = model
            .classes()
            .map(|class| ClassSummary {
                class: class.clone(),
                train_docs: model.train_docs(class).len(),
                test_docs: model.test_docs(class).len(),
                prior: model.prior(class).unwrap_or(f64::NEG_INFINITY),
                vocabulary_size: model.vocabulary_size(class),
                total_words: model.total_words(class),
            })
            .collect();

        Self {
            model_path: model_path.into(),
            classes,
            total_train_docs: model.total_train_docs(),
            total_test_docs: model.total_test_docs(),
            aggregation,
            evaluation,
        }
    }
}

/// Output a run summary based on the specified format.
pub fn output_result(message: &str, summary: &RunSummary, args: &CorpusBayesArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => output_human(message, summary, args),
        OutputFormat::Json => output_json(summary, args),
    }
}

/// Output in human-readable format.
fn output_human(message: &str, summary: &RunSummary, args: &CorpusBayesArgs) -> Result<()> {
    if args.verbosity() > 0 {
        println!("{message}");
        println!();
    }
    print!("{}", render_human(summary));
    Ok(())
}

/// Render a run summary as text.
pub fn render_human(summary: &RunSummary) -> String {
    let mut out = String::new();

    out.push_str("Model:\n");
    out.push_str("══════\n");
    out.push_str(&format!("Saved at: {}\n", summary.model_path));
    out.push_str(&format!(
        "Documents: {} train, {} test\n",
        summary.total_train_docs, summary.total_test_docs
    ));

    let width = summary
        .classes
        .iter()
        .map(|c| c.class.chars().count())
        .chain(std::iter::once("Class".len()))
        .max()
        .unwrap_or(5);
    out.push('\n');
    out.push_str(&format!(
        "{:<width$}  {:>6}  {:>6}  {:>9}  {:>10}  {:>11}\n",
        "Class", "Train", "Test", "Prior", "Vocabulary", "Total words"
    ));
    out.push_str(&format!("{}\n", "─".repeat(width + 52)));
    for c in &summary.classes {
        out.push_str(&format!(
            "{:<width$}  {:>6}  {:>6}  {:>9.4}  {:>10}  {:>11}\n",
            c.class, c.train_docs, c.test_docs, c.prior, c.vocabulary_size, c.total_words
        ));
    }

    if let Some(metrics) = &summary.aggregation {
        out.push('\n');
        out.push_str("Aggregation:\n");
        out.push_str("════════════\n");
        out.push_str(&format!(
            "Documents read: {}\nTokens: {}\nShards: {}\n",
            metrics.documents_read, metrics.tokens_emitted, metrics.shards_executed
        ));
        if metrics.malformed_lines > 0 {
            out.push_str(&format!("Malformed lines skipped: {}\n", metrics.malformed_lines));
        }
        out.push_str(&format!("Time: {:.2?}\n", metrics.total_time()));
    }

    if let Some(report) = &summary.evaluation {
        out.push('\n');
        out.push_str(&format!("Evaluation ({}):\n", report.classifier));
        out.push_str("═══════════\n");
        out.push_str(&format!("{report}\n"));
    }

    out
}

/// Output in JSON format.
fn output_json(summary: &RunSummary, args: &CorpusBayesArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(summary)?
    } else {
        serde_json::to_string(summary)?
    };

    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::aggregation::WordFrequencyTable;
    use crate::corpus::CorpusSplit;
    use crate::model::ModelBuilder;

    fn model() -> NaiveBayesModel {
        let mut train = BTreeMap::new();
        train.insert("earn".to_string(), vec!["e1".to_string(), "e2".to_string()]);
        train.insert("grain".to_string(), vec!["g1".to_string()]);
        let mut test = BTreeMap::new();
        test.insert("earn".to_string(), vec!["e3".to_string()]);
        test.insert("grain".to_string(), vec![]);

        let table = |pairs: &[(&str, u64)]| -> WordFrequencyTable {
            pairs.iter().map(|(t, c)| (t.to_string(), *c)).collect()
        };
        ModelBuilder::new(CorpusSplit::from_parts(train, test))
            .add_class_counts("earn", table(&[("profit", 3), ("share", 2)]))
            .add_class_counts("grain", table(&[("wheat", 4)]))
            .build()
            .unwrap()
    }

    #[test]
    fn test_summary() {
        let summary = RunSummary::new("out/Classifier", &model(), None, None);
        assert_eq!(summary.classes.len(), 2);
        assert_eq!(summary.total_train_docs, 3);
        assert_eq!(summary.total_test_docs, 1);
        assert_eq!(summary.classes[0].class, "earn");
        assert_eq!(summary.classes[0].vocabulary_size, 2);
        assert_eq!(summary.classes[1].total_words, 4);
    }

    #[test]
    fn test_render_human() {
        let summary = RunSummary::new(
            "out/Classifier",
            &model(),
            Some(AggregationMetrics::default()),
            None,
        );
        let text = render_human(&summary);
        assert!(text.contains("Saved at: out/Classifier"));
        assert!(text.contains("Documents: 3 train, 1 test"));
        assert!(text.contains("grain"));
        assert!(text.contains("Aggregation:"));
        assert!(!text.contains("Evaluation"));
    }

    #[test]
    fn test_json_summary() {
        let summary = RunSummary::new("out/Classifier", &model(), None, None);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["classes"][1]["class"], "grain");
        assert!(json["evaluation"].is_null());
    }
}
