//! Standard scaling (Z-score normalization).
//!
//! Transforms features by removing the mean and scaling to unit variance:
//!
//! ```text
//! z = (x - u) / s
//! ```
//!
//! where `u` and `s` are the per-feature mean and population standard
//! deviation learned from the training partition. A feature with zero
//! variance at fit time gets its stored std replaced with 1.0, so the naive
//! formula never divides by zero and a constant training value transforms
//! to exactly 0.
//!
//! Columns must arrive in feature-schema order; the fitted scaler only
//! checks the count, not the names.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Unfitted standard scaler.
///
/// # Example
/// ```
/// use ndarray::array;
/// use loan_approval::scaling::StandardScaler;
///
/// let data = array![[1.0, 10.0], [3.0, 10.0]];
/// let fitted = StandardScaler::new().fit(&data).unwrap();
/// let scaled = fitted.transform_vec(&[1.0, 10.0]).unwrap();
/// assert_eq!(scaled, vec![-1.0, 0.0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StandardScaler;

impl StandardScaler {
    /// Create a new scaler.
    pub fn new() -> Self {
        Self
    }

    /// Learn per-feature mean and standard deviation from training data.
    ///
    /// Uses the population standard deviation (ddof = 0).
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidDataset`] on an empty matrix.
    pub fn fit(&self, data: &Array2<f64>) -> Result<FittedStandardScaler, PipelineError> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(PipelineError::InvalidDataset(
                "cannot fit a scaler on empty data".to_string(),
            ));
        }

        let mean: Vec<f64> = data
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_else(|| vec![0.0; cols]);

        let n = rows as f64;
        let mut std = Vec::with_capacity(cols);
        for (j, &m) in mean.iter().enumerate() {
            let var = data
                .index_axis(Axis(1), j)
                .iter()
                .map(|&x| (x - m) * (x - m))
                .sum::<f64>()
                / n;
            let s = var.sqrt();
            // Constant features would divide by zero; store 1.0 so the
            // centered value maps to 0 instead.
            std.push(if s == 0.0 { 1.0 } else { s });
        }

        Ok(FittedStandardScaler {
            mean,
            std,
            n_features: cols,
        })
    }
}

/// Fitted standard scaler ready for inference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedStandardScaler {
    mean: Vec<f64>,
    std: Vec<f64>,
    n_features: usize,
}

impl FittedStandardScaler {
    /// Per-feature means in schema order.
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Per-feature standard deviations in schema order (zero-variance
    /// features hold 1.0).
    pub fn std(&self) -> &[f64] {
        &self.std
    }

    /// Number of features seen during fit.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Standardize a single feature vector.
    ///
    /// # Errors
    /// [`PipelineError::SchemaMismatch`] if the vector length differs from
    /// the fitted feature count.
    pub fn transform_vec(&self, x: &[f64]) -> Result<Vec<f64>, PipelineError> {
        if x.len() != self.n_features {
            return Err(PipelineError::SchemaMismatch {
                expected: self.n_features,
                got: x.len(),
            });
        }
        Ok(x.iter()
            .zip(self.mean.iter().zip(self.std.iter()))
            .map(|(&v, (&m, &s))| (v - m) / s)
            .collect())
    }

    /// Standardize a whole matrix row by row.
    ///
    /// # Errors
    /// [`PipelineError::SchemaMismatch`] if the column count differs from
    /// the fitted feature count.
    pub fn transform_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>, PipelineError> {
        let (rows, cols) = data.dim();
        if cols != self.n_features {
            return Err(PipelineError::SchemaMismatch {
                expected: self.n_features,
                got: cols,
            });
        }
        let mut out = data.clone();
        for mut row in out.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (*v - self.mean[j]) / self.std[j];
            }
        }
        debug_assert_eq!(out.dim(), (rows, cols));
        Ok(out)
    }
}
