use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use sapling_io::{PredictionWriter, RecordReader, TableReader};
use sapling_tree::{DecisionTree, DecisionTreeConfig, ThresholdPolicy};

#[derive(Parser)]
#[command(name = "sapling")]
#[command(about = "Gain-ratio decision tree induction for CSV data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for batch prediction (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Fit a decision tree on a labeled CSV file and save it as JSON
    Train {
        /// Path to the training CSV file
        #[arg(long)]
        data: PathBuf,

        /// Name of the class label column
        #[arg(long)]
        label: String,

        /// Path of the model file to write
        #[arg(long)]
        model: PathBuf,

        /// Numeric split point rule: "midpoint" or "median"
        #[arg(long, default_value = "midpoint")]
        threshold_policy: String,

        /// Maximum tree depth (unlimited if not set)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Classify every row of a CSV file with a saved model
    Predict {
        /// Path to the CSV file to classify
        #[arg(long)]
        data: PathBuf,

        /// Path to the saved model file
        #[arg(long)]
        model: PathBuf,

        /// Path of the output CSV file
        #[arg(long)]
        output: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    model: String,
    label: String,
    n_rows: usize,
    n_attributes: usize,
    threshold_policy: ThresholdPolicy,
    max_depth: Option<usize>,
    n_nodes: usize,
    n_leaves: usize,
    depth: usize,
}

#[derive(Serialize)]
struct PredictOutput {
    output: String,
    n_rows: usize,
    n_unknown: usize,
    accuracy: Option<f64>,
}

fn parse_threshold_policy(s: &str) -> Result<ThresholdPolicy> {
    match s {
        "midpoint" => Ok(ThresholdPolicy::Midpoint),
        "median" => Ok(ThresholdPolicy::Median),
        other => anyhow::bail!("unknown threshold policy: {other} (expected midpoint or median)"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            label,
            model,
            threshold_policy,
            max_depth,
        } => {
            let policy = parse_threshold_policy(&threshold_policy)?;

            let dataset = TableReader::new(&data)
                .with_label(label.clone())
                .read()
                .context("failed to read training CSV")?;

            let config = DecisionTreeConfig::new()
                .with_threshold_policy(policy)
                .with_max_depth(max_depth);
            let tree = config.fit(&dataset).context("training failed")?;
            info!(
                n_nodes = tree.n_nodes(),
                depth = tree.depth(),
                "decision tree trained"
            );

            tree.save(&model)
                .with_context(|| format!("failed to save model to {}", model.display()))?;

            let output = TrainOutput {
                model: model.display().to_string(),
                label,
                n_rows: dataset.n_rows(),
                n_attributes: tree.attributes().len(),
                threshold_policy: tree.threshold_policy(),
                max_depth,
                n_nodes: tree.n_nodes(),
                n_leaves: tree.n_leaves(),
                depth: tree.depth(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Predict {
            data,
            model,
            output,
        } => {
            let tree = DecisionTree::load(&model)
                .with_context(|| format!("failed to load model from {}", model.display()))?;

            let table = RecordReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            let predictions = tree.predict_batch(&table.records());
            let n_unknown = predictions
                .iter()
                .filter(|&&p| p == sapling_tree::UNKNOWN_CLASS)
                .count();
            info!(n_rows = predictions.len(), n_unknown, "prediction complete");

            // Accuracy is only available when the input carries the label column.
            let accuracy = table.accuracy(tree.label(), &predictions);
            if let Some(accuracy) = accuracy {
                info!(accuracy, "accuracy against label column");
            }

            PredictionWriter::new(&output)?
                .write(&table, &predictions)
                .context("failed to write predictions")?;

            let summary = PredictOutput {
                output: output.display().to_string(),
                n_rows: predictions.len(),
                n_unknown,
                accuracy,
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
