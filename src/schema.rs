//! Feature schema: the ordered feature-name contract between training and
//! inference.
//!
//! The schema is derived once at training time as every dataset column
//! except the row identifier and the target, in the dataset's original
//! column order. Every inference request must supply exactly this set of
//! keys; missing keys are a hard error, extra keys are ignored (a deliberate
//! asymmetry that lets clients add fields without breaking older models).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Ordered list of feature names shared by training and inference.
///
/// # Example
/// ```
/// use loan_approval::schema::FeatureSchema;
///
/// let columns = ["loan_id", "income_annum", "loan_status"]
///     .map(String::from);
/// let schema = FeatureSchema::derive(&columns, "loan_id", "loan_status");
/// assert_eq!(schema.features(), &["income_annum".to_string()]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    features: Vec<String>,
}

impl FeatureSchema {
    /// Derive the schema from dataset columns, excluding the identifier and
    /// target columns and keeping the original column order.
    pub fn derive(columns: &[String], id_column: &str, target_column: &str) -> Self {
        let features = columns
            .iter()
            .filter(|c| c.as_str() != id_column && c.as_str() != target_column)
            .cloned()
            .collect();
        Self { features }
    }

    /// Build a schema from an explicit feature list (artifact loading).
    pub fn from_features(features: Vec<String>) -> Self {
        Self { features }
    }

    /// Feature names in schema order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the schema has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Validate a raw record against the schema.
    ///
    /// Returns the record's raw values reordered into schema order. Keys not
    /// named by the schema are ignored.
    ///
    /// # Errors
    /// [`PipelineError::MissingFeatures`] naming every absent key, not just
    /// the first one.
    pub fn validate<'a>(
        &self,
        record: &'a HashMap<String, String>,
    ) -> Result<Vec<&'a str>, PipelineError> {
        let missing: Vec<String> = self
            .features
            .iter()
            .filter(|f| !record.contains_key(f.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(PipelineError::MissingFeatures(missing));
        }
        Ok(self
            .features
            .iter()
            .map(|f| record[f.as_str()].as_str())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> FeatureSchema {
        let columns: Vec<String> = ["loan_id", "education", "cibil_score", "loan_status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        FeatureSchema::derive(&columns, "loan_id", "loan_status")
    }

    fn record(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_derive_excludes_id_and_target_keeps_order() {
        let s = schema();
        assert_eq!(s.features(), &["education".to_string(), "cibil_score".to_string()]);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_validate_returns_schema_order() {
        let s = schema();
        // insertion order of the map must not matter
        let rec = record(&[("cibil_score", "750"), ("education", "graduate")]);
        let values = s.validate(&rec).unwrap();
        assert_eq!(values, vec!["graduate", "750"]);
    }

    #[test]
    fn test_validate_lists_every_missing_feature() {
        let s = schema();
        let rec = record(&[]);
        let err = s.validate(&rec).unwrap_err();
        match err {
            PipelineError::MissingFeatures(names) => {
                assert_eq!(names, vec!["education".to_string(), "cibil_score".to_string()]);
            }
            other => panic!("expected MissingFeatures, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_names_single_missing_feature() {
        let s = schema();
        let rec = record(&[("education", "graduate")]);
        let err = s.validate(&rec).unwrap_err();
        match err {
            PipelineError::MissingFeatures(names) => {
                assert_eq!(names, vec!["cibil_score".to_string()]);
            }
            other => panic!("expected MissingFeatures, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_ignores_extra_keys() {
        let s = schema();
        let rec = record(&[
            ("education", "graduate"),
            ("cibil_score", "750"),
            ("csrf_token", "abc123"),
        ]);
        let values = s.validate(&rec).unwrap();
        assert_eq!(values, vec!["graduate", "750"]);
    }

    #[test]
    fn test_serialization_round_trip() {
        let s = schema();
        let bytes = bincode::serialize(&s).unwrap();
        let loaded: FeatureSchema = bincode::deserialize(&bytes).unwrap();
        assert_eq!(loaded, s);
    }
}
