//! Inference pipeline: one raw record in, one decision out.
//!
//! A [`Scorer`] is an explicitly constructed, immutable service object
//! around a loaded artifact bundle. It is `Send + Sync` and stateless per
//! call, so callers may share one instance behind an `Arc` across threads
//! with no locking. [`ScoringService`] is the one-load-per-process wrapper
//! a serving layer holds: if the bundle fails to load it stays degraded and
//! answers every request with [`PipelineError::ModelUnavailable`] instead
//! of silently retrying.
//!
//! Each validation step is a hard gate. The first failure aborts the
//! request with an error naming the offending field; the pipeline never
//! substitutes a default or guessed value.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::artifacts::ArtifactBundle;
use crate::error::PipelineError;

/// Target label that counts as an approval.
pub const APPROVED_LABEL: &str = "approved";

/// Outcome of scoring one record.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Decoded class label, e.g. `"approved"` or `"rejected"`.
    pub label: String,
    /// Probability mass of the predicted class, as a percentage in
    /// `[0, 100]`.
    pub confidence: f64,
    /// Whether the predicted label equals [`APPROVED_LABEL`].
    pub approved: bool,
}

impl Prediction {
    /// Confidence formatted for display, one decimal place: `"93.0%"`.
    pub fn confidence_display(&self) -> String {
        format!("{:.1}%", self.confidence)
    }
}

/// The applicant record from the original web form, used as a prefill
/// sample and in tests.
pub fn sample_record() -> HashMap<String, String> {
    [
        ("no_of_dependents", "2"),
        ("education", "Graduate"),
        ("self_employed", "No"),
        ("income_annum", "7000000"),
        ("loan_amount", "3000000"),
        ("loan_term", "12"),
        ("cibil_score", "750"),
        ("residential_assets_value", "3000000"),
        ("commercial_assets_value", "2000000"),
        ("luxury_assets_value", "10000000"),
        ("bank_asset_value", "5000000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Immutable scoring service over a loaded artifact bundle.
///
/// # Example
/// ```no_run
/// use loan_approval::inference::{sample_record, Scorer};
///
/// let scorer = Scorer::load("models").unwrap();
/// let prediction = scorer.predict_one(&sample_record()).unwrap();
/// println!("{} ({})", prediction.label, prediction.confidence_display());
/// ```
#[derive(Clone, Debug)]
pub struct Scorer {
    bundle: ArtifactBundle,
}

impl Scorer {
    /// Wrap an already loaded bundle.
    pub fn new(bundle: ArtifactBundle) -> Self {
        Self { bundle }
    }

    /// Load the bundle from an artifact directory.
    ///
    /// # Errors
    /// [`PipelineError::ArtifactLoad`] on a missing, partial or
    /// inconsistent bundle.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, PipelineError> {
        Ok(Self::new(ArtifactBundle::load(dir)?))
    }

    /// The underlying artifact bundle.
    pub fn bundle(&self) -> &ArtifactBundle {
        &self.bundle
    }

    /// Score one raw record.
    ///
    /// Gates, in order: schema validation (missing keys listed, extra keys
    /// ignored) → categorical normalize + encode → numeric coercion →
    /// scale → classify → decode the label and take its probability mass
    /// as the confidence.
    ///
    /// Pure and deterministic: the same record always yields the same
    /// prediction.
    ///
    /// # Errors
    /// [`PipelineError::MissingFeatures`], [`PipelineError::UnknownCategory`],
    /// [`PipelineError::NonNumericValue`] or [`PipelineError::SchemaMismatch`].
    pub fn predict_one(
        &self,
        record: &HashMap<String, String>,
    ) -> Result<Prediction, PipelineError> {
        let bundle = &self.bundle;
        let raw_values = bundle.schema.validate(record)?;

        // categorical pass first, across every encoder-backed feature,
        // then numeric coercion: an unknown category is reported even
        // when a malformed number sits earlier in the schema
        let mut vector = vec![0.0; raw_values.len()];
        for (i, (feature, raw)) in bundle.schema.features().iter().zip(&raw_values).enumerate() {
            if bundle.encoders.contains(feature) {
                vector[i] = bundle.encoders.encode(feature, raw)? as f64;
            }
        }
        for (i, (feature, raw)) in bundle.schema.features().iter().zip(&raw_values).enumerate() {
            if !bundle.encoders.contains(feature) {
                vector[i] =
                    raw.trim()
                        .parse::<f64>()
                        .map_err(|_| PipelineError::NonNumericValue {
                            feature: feature.clone(),
                            value: raw.to_string(),
                        })?;
            }
        }

        let scaled = bundle.scaler.transform_vec(&vector)?;
        let (class, proba) = bundle.model.predict(&scaled)?;
        let label = bundle.encoders.decode(&bundle.target_column, class)?;

        Ok(Prediction {
            label: label.to_string(),
            confidence: proba[class] * 100.0,
            approved: label == APPROVED_LABEL,
        })
    }
}

/// Process-lifetime holder of an optional [`Scorer`].
///
/// Loads the bundle once at construction. A failed load is logged and the
/// service stays degraded for its lifetime; restart the process with valid
/// artifacts to recover.
#[derive(Clone, Debug)]
pub struct ScoringService {
    scorer: Option<Arc<Scorer>>,
}

impl ScoringService {
    /// Load the bundle from `dir`, degrading on failure instead of erroring.
    pub fn initialize<P: AsRef<Path>>(dir: P) -> Self {
        match Scorer::load(&dir) {
            Ok(scorer) => Self {
                scorer: Some(Arc::new(scorer)),
            },
            Err(err) => {
                warn!(
                    dir = %dir.as_ref().display(),
                    error = %err,
                    "artifact bundle unavailable, serving degraded"
                );
                Self { scorer: None }
            }
        }
    }

    /// Wrap an already constructed scorer.
    pub fn from_scorer(scorer: Scorer) -> Self {
        Self {
            scorer: Some(Arc::new(scorer)),
        }
    }

    /// A service with no model, always degraded.
    pub fn unavailable() -> Self {
        Self { scorer: None }
    }

    /// Whether a model is loaded.
    pub fn is_available(&self) -> bool {
        self.scorer.is_some()
    }

    /// Score one record, or [`PipelineError::ModelUnavailable`] while
    /// degraded.
    pub fn predict_one(
        &self,
        record: &HashMap<String, String>,
    ) -> Result<Prediction, PipelineError> {
        match &self.scorer {
            Some(scorer) => scorer.predict_one(record),
            None => Err(PipelineError::ModelUnavailable),
        }
    }
}
