//! Train the loan approval model and persist the artifact bundle.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use loan_approval::training::{train, TrainConfig};

#[derive(Parser, Debug)]
#[command(name = "train", about = "Train the loan approval classifier")]
struct Args {
    /// Path to the training CSV.
    #[arg(long, default_value = "data/loan_data.csv")]
    dataset: PathBuf,

    /// Directory to write the artifact bundle into.
    #[arg(long, default_value = "models")]
    out: PathBuf,

    /// Held-out fraction for evaluation.
    #[arg(long, default_value_t = 0.2)]
    test_size: f64,

    /// Random seed for the split and the bootstrap sampling.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Number of trees in the forest.
    #[arg(long, default_value_t = 100)]
    n_estimators: usize,

    /// Maximum depth per tree (unlimited if omitted).
    #[arg(long)]
    max_depth: Option<usize>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = TrainConfig {
        dataset_path: args.dataset,
        artifacts_dir: args.out,
        test_size: args.test_size,
        seed: args.seed,
        n_estimators: args.n_estimators,
        max_depth: args.max_depth,
        ..TrainConfig::default()
    };

    // Training errors are fatal: nothing was persisted, exit non-zero.
    match train(&config) {
        Ok((_, report)) => {
            println!(
                "trained on {} rows ({} train / {} test), {} features",
                report.n_rows, report.n_train, report.n_test, report.n_features
            );
            print!("{}", report.report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "training failed");
            ExitCode::FAILURE
        }
    }
}
