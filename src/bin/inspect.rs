//! Read-only diagnostics for datasets and artifact bundles.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use loan_approval::artifacts::ArtifactBundle;
use loan_approval::dataset::LoanTable;

#[derive(Parser, Debug)]
#[command(name = "inspect", about = "Inspect a dataset or an artifact bundle")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show dataset shape, missing-value counts and target distribution.
    Data {
        /// Path to the CSV file.
        path: PathBuf,
        /// Target column for the class distribution.
        #[arg(long, default_value = "loan_status")]
        target: String,
    },
    /// Show encoder mappings, feature schema and model metadata.
    Artifacts {
        /// Artifact bundle directory.
        dir: PathBuf,
    },
}

fn inspect_data(path: &PathBuf, target: &str) -> Result<()> {
    let mut table = LoanTable::from_csv_path(path)
        .with_context(|| format!("loading {}", path.display()))?;

    println!("{} rows, {} columns", table.n_rows(), table.columns().len());
    println!("\nmissing values per column:");
    for (column, count) in table.missing_value_counts() {
        println!("  {:<28} {}", column, count);
    }

    if table.column_index(target).is_some() {
        table.normalize_text_columns(&[target])?;
        let mut counts: Vec<(String, usize)> =
            table.value_counts(target)?.into_iter().collect();
        counts.sort();
        println!("\n{} distribution:", target);
        for (value, count) in counts {
            println!("  {:<14} {}", value, count);
        }
    }
    Ok(())
}

fn inspect_artifacts(dir: &PathBuf) -> Result<()> {
    let bundle = ArtifactBundle::load(dir)
        .with_context(|| format!("loading artifacts from {}", dir.display()))?;

    println!("target column: {}", bundle.target_column);
    println!(
        "model: random forest, {} trees, {} classes, {} features",
        bundle.model.n_trees(),
        bundle.model.n_classes(),
        bundle.model.n_features()
    );
    println!("scaler: {} features", bundle.scaler.n_features());

    println!("\nfeature schema ({}):", bundle.schema.len());
    for feature in bundle.schema.features() {
        println!("  {}", feature);
    }

    println!("\nencoders:");
    for column in bundle.encoders.columns() {
        let classes = bundle.encoders.allowed_values(column)?;
        println!("  {:<16} {:?}", column, classes);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    match &args.command {
        Command::Data { path, target } => inspect_data(path, target),
        Command::Artifacts { dir } => inspect_artifacts(dir),
    }
}
