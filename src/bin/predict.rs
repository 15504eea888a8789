//! Score a single applicant record against a trained artifact bundle.
//!
//! The record is a flat JSON object read from a file or stdin; values may
//! be strings or numbers. Field names must match the training feature
//! columns (unknown extra fields are ignored).

use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;

use loan_approval::inference::{sample_record, Scorer};

#[derive(Parser, Debug)]
#[command(name = "predict", about = "Score one loan application record")]
struct Args {
    /// Artifact bundle directory.
    #[arg(long, default_value = "models")]
    artifacts: PathBuf,

    /// JSON record file; reads stdin when omitted.
    #[arg(long)]
    record: Option<PathBuf>,

    /// Score the built-in sample record instead of reading input.
    #[arg(long, conflicts_with = "record")]
    sample: bool,
}

fn read_record(args: &Args) -> Result<HashMap<String, String>> {
    if args.sample {
        return Ok(sample_record());
    }

    let raw = match &args.record {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("cannot read stdin")?;
            buf
        }
    };

    let json: Value = serde_json::from_str(&raw).context("record is not valid JSON")?;
    let Value::Object(map) = json else {
        bail!("record must be a JSON object of feature name to value");
    };

    let mut record = HashMap::new();
    for (key, value) in map {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => bail!("unsupported value for '{}': {}", key, other),
        };
        record.insert(key, text);
    }
    Ok(record)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let record = read_record(&args)?;

    let scorer = Scorer::load(&args.artifacts)
        .with_context(|| format!("loading artifacts from {}", args.artifacts.display()))?;
    let prediction = scorer.predict_one(&record)?;

    println!(
        "{}",
        serde_json::json!({
            "prediction": prediction.label,
            "confidence": prediction.confidence_display(),
            "approved": prediction.approved,
        })
    );
    Ok(())
}
