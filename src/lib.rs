//! # loan-approval
//!
//! Loan approval prediction with a strict artifact contract between the
//! training stage and the serving stage.
//!
//! The hard requirement is bit-consistency: categorical encoding, numeric
//! coercion and standard scaling must be applied identically, and in the
//! same order, at training time and at inference time, or predictions
//! silently corrupt. This crate keeps both stages on one code path: the
//! training pipeline fits the encoders, feature schema, scaler and
//! random-forest classifier and persists them as an immutable artifact
//! bundle; the inference pipeline loads that bundle read-only and pushes
//! every request through the same validation and transform steps.
//!
//! ## Core Design Principles
//!
//! - **Fitted/unfitted separation**: configuration types (`StandardScaler`,
//!   `RandomForestClassifier`) fit into immutable `Fitted*` types that carry
//!   only what inference needs and serialize losslessly.
//! - **Fail-fast validation**: every inference gate rejects with an error
//!   naming the exact offending field; no defaults, no guesses, no retries.
//! - **Reproducibility**: a fixed seed and identical input data reproduce a
//!   byte-identical artifact bundle and identical evaluation metrics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use loan_approval::inference::{sample_record, Scorer};
//! use loan_approval::training::{train, TrainConfig};
//!
//! // Offline: fit everything and persist the bundle.
//! let (_, report) = train(&TrainConfig::default()).unwrap();
//! println!("held-out accuracy: {:.4}", report.accuracy());
//!
//! // Serving: load once, score many.
//! let scorer = Scorer::load("models").unwrap();
//! let prediction = scorer.predict_one(&sample_record()).unwrap();
//! println!("{} ({})", prediction.label, prediction.confidence_display());
//! ```
//!
//! ## Module Structure
//!
//! - `dataset` — CSV loading and categorical text normalization
//! - `encoding` — per-column label ↔ code registry
//! - `schema` — ordered feature-name contract
//! - `scaling` — standard (Z-score) scaler
//! - `forest` — CART trees and the random-forest classifier
//! - `model_selection` — seeded stratified train/test split
//! - `metrics` — accuracy and per-class precision/recall
//! - `artifacts` — five-blob bundle persistence
//! - `training` — the offline batch pipeline
//! - `inference` — the per-request scoring pipeline

pub mod artifacts;
pub mod dataset;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod inference;
pub mod metrics;
pub mod model_selection;
pub mod scaling;
pub mod schema;
pub mod training;

pub use artifacts::ArtifactBundle;
pub use encoding::{CategoryEncoder, EncodingRegistry};
pub use error::PipelineError;
pub use forest::{FittedRandomForest, RandomForestClassifier};
pub use inference::{Prediction, Scorer, ScoringService};
pub use scaling::{FittedStandardScaler, StandardScaler};
pub use schema::FeatureSchema;
pub use training::{train, TrainConfig, TrainReport};
