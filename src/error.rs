//! Error types for the training and inference pipelines.

use std::fmt;

/// Error type covering every failure mode of the pipeline.
///
/// Training-side errors (`DatasetNotFound`, `InvalidDataset`, `Io`,
/// `Serialization`) are fatal: the training run aborts and no artifact file
/// is written. Inference-side errors (`ModelUnavailable`, `MissingFeatures`,
/// `UnknownCategory`, `NonNumericValue`, `SchemaMismatch`, `InvalidCode`) are
/// recovered at the request boundary; each message names the offending field
/// so it can be surfaced to the caller as-is.
#[derive(Debug)]
pub enum PipelineError {
    /// Source dataset file does not exist.
    DatasetNotFound(String),
    /// Dataset exists but cannot be parsed or fails a structural check.
    InvalidDataset(String),
    /// Artifact bundle is missing, partial, corrupt, or from an
    /// incompatible format version.
    ArtifactLoad(String),
    /// No artifact bundle is loaded; the serving side is degraded.
    ModelUnavailable,
    /// Record is missing one or more schema features. Lists every absent key.
    MissingFeatures(Vec<String>),
    /// Categorical value was never observed during training.
    UnknownCategory {
        column: String,
        value: String,
        allowed: Vec<String>,
    },
    /// Non-categorical feature value could not be coerced to a number.
    NonNumericValue { feature: String, value: String },
    /// Feature vector length differs from the fitted feature count.
    SchemaMismatch { expected: usize, got: usize },
    /// Class code has no label in the encoding registry.
    InvalidCode { column: String, code: usize },
    /// I/O error during file operations.
    Io(String),
    /// Serialization or deserialization error.
    Serialization(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::DatasetNotFound(path) => {
                write!(f, "Dataset not found: {}", path)
            }
            PipelineError::InvalidDataset(msg) => {
                write!(f, "Invalid dataset: {}", msg)
            }
            PipelineError::ArtifactLoad(msg) => {
                write!(f, "Failed to load artifacts: {}", msg)
            }
            PipelineError::ModelUnavailable => {
                write!(f, "Model not loaded. Run training to produce an artifact bundle")
            }
            PipelineError::MissingFeatures(names) => {
                write!(f, "Missing required features: {}", names.join(", "))
            }
            PipelineError::UnknownCategory {
                column,
                value,
                allowed,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for {}. Allowed values: {:?}",
                    value, column, allowed
                )
            }
            PipelineError::NonNumericValue { feature, value } => {
                write!(f, "Non-numeric value '{}' for feature {}", value, feature)
            }
            PipelineError::SchemaMismatch { expected, got } => {
                write!(
                    f,
                    "Schema mismatch: expected {} features, got {}",
                    expected, got
                )
            }
            PipelineError::InvalidCode { column, code } => {
                write!(f, "Unknown class code {} for column {}", code, column)
            }
            PipelineError::Io(msg) => {
                write!(f, "I/O error: {}", msg)
            }
            PipelineError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        PipelineError::InvalidDataset(err.to_string())
    }
}
