//! Categorical label encoding.
//!
//! Each categorical column gets a [`CategoryEncoder`] mapping normalized
//! label strings to dense integer codes. Codes are assigned in ascending
//! lexicographic order of the normalized labels; this ordering is part of
//! the artifact contract, not an incidental implementation detail, because
//! the classifier's class codes are only meaningful relative to it.
//!
//! Encoders are fit once at training time and reused unmodified at
//! inference time. An inference-time lookup of a label that was never seen
//! during training is a hard error, never a silent default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::dataset::normalize_label;
use crate::error::PipelineError;

/// Bidirectional label ↔ code mapping for one categorical column.
///
/// Labels are stored normalized (trimmed, lowercased) in ascending sorted
/// order, so a label's code is simply its position in the class list and
/// lookups are binary searches over that list.
///
/// # Example
/// ```
/// use loan_approval::encoding::CategoryEncoder;
///
/// let enc = CategoryEncoder::fit(["Graduate", "Not Graduate", " graduate "]).unwrap();
/// assert_eq!(enc.classes(), &["graduate".to_string(), "not graduate".to_string()]);
/// assert_eq!(enc.code_of("GRADUATE"), Some(0));
/// assert_eq!(enc.label_of(1), Some("not graduate"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEncoder {
    /// Normalized labels in ascending sorted order; index = code.
    classes: Vec<String>,
}

impl CategoryEncoder {
    /// Fit an encoder on raw label values.
    ///
    /// Values are normalized, deduplicated, and sorted ascending; the code
    /// of each class is its index in the resulting list.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] on an empty value sequence.
    pub fn fit<I, S>(values: I) -> Result<Self, PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classes: Vec<String> = values
            .into_iter()
            .map(|v| normalize_label(v.as_ref()))
            .collect();
        if classes.is_empty() {
            return Err(PipelineError::InvalidDataset(
                "cannot fit an encoder on an empty column".to_string(),
            ));
        }
        classes.sort();
        classes.dedup();
        Ok(Self { classes })
    }

    /// The normalized classes in code order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Number of distinct classes.
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Code for a raw label, normalizing first. `None` if unseen.
    pub fn code_of(&self, value: &str) -> Option<usize> {
        let normalized = normalize_label(value);
        self.classes.binary_search(&normalized).ok()
    }

    /// Label for a code. `None` if out of range.
    pub fn label_of(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }
}

/// Per-column encoder registry: one entry per categorical feature column
/// plus one for the target column.
///
/// Fit once by the training pipeline, persisted in the artifact bundle, and
/// consumed read-only by every inference call. Column iteration order is
/// deterministic (`BTreeMap`), which keeps serialized artifacts
/// byte-reproducible across runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodingRegistry {
    encoders: BTreeMap<String, CategoryEncoder>,
}

impl EncodingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit and register an encoder for one column.
    pub fn fit_column<I, S>(&mut self, column: &str, values: I) -> Result<(), PipelineError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let encoder = CategoryEncoder::fit(values)?;
        self.encoders.insert(column.to_string(), encoder);
        Ok(())
    }

    /// Whether the registry has an encoder for `column`.
    pub fn contains(&self, column: &str) -> bool {
        self.encoders.contains_key(column)
    }

    /// The encoder for `column`, if registered.
    pub fn encoder(&self, column: &str) -> Option<&CategoryEncoder> {
        self.encoders.get(column)
    }

    /// Registered column names in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    /// Number of registered encoders.
    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// The allowed (normalized) values for `column`.
    pub fn allowed_values(&self, column: &str) -> Result<&[String], PipelineError> {
        self.require(column).map(CategoryEncoder::classes)
    }

    /// Encode a raw value for `column`, normalizing first.
    ///
    /// # Errors
    /// [`PipelineError::UnknownCategory`] for a label not observed during
    /// training; the error enumerates the allowed values for the column.
    pub fn encode(&self, column: &str, value: &str) -> Result<usize, PipelineError> {
        let encoder = self.require(column)?;
        encoder
            .code_of(value)
            .ok_or_else(|| PipelineError::UnknownCategory {
                column: column.to_string(),
                value: normalize_label(value),
                allowed: encoder.classes().to_vec(),
            })
    }

    /// Decode a class code for `column` back to its label.
    ///
    /// # Errors
    /// [`PipelineError::InvalidCode`] if the code is out of range.
    pub fn decode(&self, column: &str, code: usize) -> Result<&str, PipelineError> {
        let encoder = self.require(column)?;
        encoder
            .label_of(code)
            .ok_or_else(|| PipelineError::InvalidCode {
                column: column.to_string(),
                code,
            })
    }

    fn require(&self, column: &str) -> Result<&CategoryEncoder, PipelineError> {
        self.encoders.get(column).ok_or_else(|| {
            PipelineError::InvalidDataset(format!("no encoder fitted for column '{}'", column))
        })
    }
}
