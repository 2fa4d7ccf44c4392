//! Command line argument parsing for the corpus-bayes CLI using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

/// Usage line printed when the positional arguments are wrong.
pub const USAGE: &str = "Usage: corpus-bayes <DATA_DIR> <OUTPUT_DIR>";

/// corpus-bayes - Naive Bayes text classification over class-per-directory corpora
#[derive(Parser, Debug, Clone)]
#[command(name = "corpus-bayes")]
#[command(about = "Train and evaluate a multinomial Naive Bayes text classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CorpusBayesArgs {
    /// Dataset directory (one sub-directory per class) and output directory
    #[arg(value_name = "DATA_DIR OUTPUT_DIR", num_args = 0..)]
    pub paths: Vec<PathBuf>,

    /// Seed for a reproducible train/test split
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of worker threads (defaults to the number of CPU cores)
    #[arg(short = 't', long)]
    pub threads: Option<usize>,

    /// A document is held out for testing when its draw is at or below this value
    #[arg(long)]
    pub test_threshold: Option<f64>,

    /// JSON pipeline configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Train and save the model without evaluating it
    #[arg(long, conflicts_with = "eval_only")]
    pub skip_eval: bool,

    /// Evaluate the model already saved in OUTPUT_DIR
    #[arg(long)]
    pub eval_only: bool,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl CorpusBayesArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }

    /// The dataset and output directories, if exactly two were given.
    pub fn directories(&self) -> Option<(&PathBuf, &PathBuf)> {
        match self.paths.as_slice() {
            [data_dir, output_dir] => Some((data_dir, output_dir)),
            _ => None,
        }
    }
}

/// Output format options
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table
    Human,
    /// JSON output
    Json,
}
