//! Training pipeline: raw CSV in, artifact bundle out.
//!
//! A linear single-pass batch job with no retries. Every step must succeed
//! before the bundle is persisted; any failure aborts the run with nothing
//! written, so a serving process can never pick up a half-trained bundle.

use std::path::PathBuf;

use ndarray::Array2;
use tracing::info;

use crate::artifacts::ArtifactBundle;
use crate::dataset::LoanTable;
use crate::encoding::EncodingRegistry;
use crate::error::PipelineError;
use crate::forest::RandomForestClassifier;
use crate::metrics::{classification_report, ClassificationReport};
use crate::model_selection::{stratified_split, take_labels, take_rows};
use crate::scaling::StandardScaler;
use crate::schema::FeatureSchema;

/// Training run configuration.
///
/// Defaults match the loan application dataset this pipeline was built for:
/// `loan_id` identifier, `loan_status` target, `education` and
/// `self_employed` as the categorical features, 80/20 split, seed 42,
/// 100 trees.
#[derive(Clone, Debug)]
pub struct TrainConfig {
    pub dataset_path: PathBuf,
    pub artifacts_dir: PathBuf,
    pub id_column: String,
    pub target_column: String,
    pub categorical_columns: Vec<String>,
    pub test_size: f64,
    pub seed: u64,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/loan_data.csv"),
            artifacts_dir: PathBuf::from("models"),
            id_column: "loan_id".to_string(),
            target_column: "loan_status".to_string(),
            categorical_columns: vec!["education".to_string(), "self_employed".to_string()],
            test_size: 0.2,
            seed: 42,
            n_estimators: 100,
            max_depth: None,
        }
    }
}

/// Summary of a completed training run.
#[derive(Clone, Debug)]
pub struct TrainReport {
    pub n_rows: usize,
    pub n_features: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub report: ClassificationReport,
}

impl TrainReport {
    /// Held-out accuracy.
    pub fn accuracy(&self) -> f64 {
        self.report.accuracy
    }
}

/// Run the full training pipeline and persist the artifact bundle.
///
/// Steps: load CSV → normalize categorical text → fit encoders → derive the
/// feature schema → encode/coerce the matrix → stratified split → fit the
/// scaler on the train partition → fit the forest on the scaled train
/// partition → evaluate held-out → save the bundle.
///
/// Identical dataset and config reproduce an identical bundle and report.
///
/// # Errors
/// Any [`PipelineError`]; no artifact file is written on failure.
pub fn train(config: &TrainConfig) -> Result<(ArtifactBundle, TrainReport), PipelineError> {
    info!(dataset = %config.dataset_path.display(), "loading dataset");
    let mut table = LoanTable::from_csv_path(&config.dataset_path)?;
    info!(rows = table.n_rows(), columns = table.columns().len(), "dataset loaded");

    let mut text_columns: Vec<&str> = config
        .categorical_columns
        .iter()
        .map(String::as_str)
        .collect();
    text_columns.push(config.target_column.as_str());
    table.normalize_text_columns(&text_columns)?;

    let mut encoders = EncodingRegistry::new();
    for &column in &text_columns {
        encoders.fit_column(column, table.column(column)?)?;
        let classes = encoders.allowed_values(column)?;
        info!(column, ?classes, "encoder fitted");
    }

    let schema = FeatureSchema::derive(
        table.columns(),
        &config.id_column,
        &config.target_column,
    );
    if schema.is_empty() {
        return Err(PipelineError::InvalidDataset(
            "dataset has no feature columns".to_string(),
        ));
    }

    let (x, y) = build_matrix(&table, &schema, &encoders, &config.target_column)?;
    let target_classes = encoders.allowed_values(&config.target_column)?.to_vec();

    let (train_idx, test_idx) = stratified_split(&y, config.test_size, config.seed)?;
    let x_train = take_rows(&x, &train_idx);
    let x_test = take_rows(&x, &test_idx);
    let y_train = take_labels(&y, &train_idx);
    let y_test = take_labels(&y, &test_idx);

    let scaler = StandardScaler::new().fit(&x_train)?;
    let x_train_scaled = scaler.transform_matrix(&x_train)?;
    let x_test_scaled = scaler.transform_matrix(&x_test)?;

    info!(trees = config.n_estimators, seed = config.seed, "training forest");
    let mut classifier = RandomForestClassifier::new(config.n_estimators).with_seed(config.seed);
    if let Some(depth) = config.max_depth {
        classifier = classifier.with_max_depth(depth);
    }
    let model = classifier.fit(&x_train_scaled, &y_train, target_classes.len())?;

    let y_pred: Vec<usize> = x_test_scaled
        .rows()
        .into_iter()
        .map(|row| {
            model
                .predict(row.as_slice().unwrap_or(&[]))
                .map(|(class, _)| class)
        })
        .collect::<Result<_, _>>()?;
    let report = classification_report(&y_test, &y_pred, &target_classes);
    info!(accuracy = report.accuracy, "held-out evaluation complete");

    let bundle = ArtifactBundle {
        model,
        scaler,
        encoders,
        schema,
        target_column: config.target_column.clone(),
    };
    bundle.save(&config.artifacts_dir)?;
    info!(dir = %config.artifacts_dir.display(), "artifact bundle saved");

    let train_report = TrainReport {
        n_rows: table.n_rows(),
        n_features: bundle.schema.len(),
        n_train: train_idx.len(),
        n_test: test_idx.len(),
        report,
    };
    Ok((bundle, train_report))
}

/// Encode categorical cells and coerce numeric cells into the feature
/// matrix, plus the encoded target vector.
fn build_matrix(
    table: &LoanTable,
    schema: &FeatureSchema,
    encoders: &EncodingRegistry,
    target_column: &str,
) -> Result<(Array2<f64>, Vec<usize>), PipelineError> {
    let n_rows = table.n_rows();
    let features = schema.features();

    let column_indices: Vec<usize> = features
        .iter()
        .map(|f| {
            table.column_index(f).ok_or_else(|| {
                PipelineError::InvalidDataset(format!("dataset has no column '{}'", f))
            })
        })
        .collect::<Result<_, _>>()?;

    let mut x = Array2::<f64>::zeros((n_rows, features.len()));
    for row in 0..n_rows {
        for (j, (feature, &col)) in features.iter().zip(&column_indices).enumerate() {
            let cell = table.cell(row, col);
            x[[row, j]] = if encoders.contains(feature) {
                encoders.encode(feature, cell)? as f64
            } else {
                cell.trim().parse::<f64>().map_err(|_| {
                    PipelineError::InvalidDataset(format!(
                        "row {}: non-numeric value '{}' in column '{}'",
                        row + 1,
                        cell,
                        feature
                    ))
                })?
            };
        }
    }

    let y = table
        .column(target_column)?
        .into_iter()
        .map(|value| encoders.encode(target_column, value))
        .collect::<Result<_, _>>()?;

    Ok((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_dataset(dir: &std::path::Path, rows: usize) -> PathBuf {
        let path = dir.join("loans.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "loan_id,no_of_dependents,education,self_employed,income_annum,cibil_score,loan_status"
        )
        .unwrap();
        for i in 0..rows {
            let cibil = 300 + (i * 13) % 600;
            let status = if cibil >= 600 { "Approved" } else { " Rejected" };
            let education = if i % 2 == 0 { "Graduate" } else { "Not Graduate" };
            let employed = if i % 3 == 0 { "Yes" } else { "No" };
            writeln!(
                file,
                "{},{},{},{},{},{},{}",
                i + 1,
                i % 5,
                education,
                employed,
                1_000_000 + i * 10_000,
                cibil,
                status
            )
            .unwrap();
        }
        path
    }

    fn config(dir: &std::path::Path) -> TrainConfig {
        TrainConfig {
            dataset_path: write_dataset(dir, 60),
            artifacts_dir: dir.join("models"),
            n_estimators: 10,
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_train_produces_consistent_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, report) = train(&config(dir.path())).unwrap();

        assert_eq!(report.n_rows, 60);
        assert_eq!(report.n_features, 5);
        assert_eq!(report.n_train + report.n_test, 60);
        assert_eq!(bundle.schema.len(), bundle.scaler.n_features());
        assert_eq!(bundle.model.n_classes(), 2);
        // separable rule, forest should learn it well
        assert!(report.accuracy() > 0.8, "accuracy = {}", report.accuracy());
        assert!(dir.path().join("models").join("loan_model.bin").exists());
    }

    #[test]
    fn test_schema_excludes_id_and_target() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = train(&config(dir.path())).unwrap();
        let features = bundle.schema.features();
        assert!(!features.contains(&"loan_id".to_string()));
        assert!(!features.contains(&"loan_status".to_string()));
        assert_eq!(features[0], "no_of_dependents");
    }

    #[test]
    fn test_target_labels_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let (bundle, _) = train(&config(dir.path())).unwrap();
        assert_eq!(
            bundle.encoders.allowed_values("loan_status").unwrap(),
            &["approved".to_string(), "rejected".to_string()]
        );
    }

    #[test]
    fn test_missing_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = TrainConfig {
            dataset_path: dir.path().join("nope.csv"),
            artifacts_dir: dir.path().join("models"),
            ..TrainConfig::default()
        };
        let err = train(&cfg).unwrap_err();
        assert!(matches!(err, PipelineError::DatasetNotFound(_)));
        assert!(!dir.path().join("models").exists());
    }

    #[test]
    fn test_non_numeric_cell_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "loan_id,education,self_employed,cibil_score,loan_status\n\
             1,Graduate,No,oops,Approved\n\
             2,Graduate,No,500,Rejected\n",
        )
        .unwrap();
        let cfg = TrainConfig {
            dataset_path: path,
            artifacts_dir: dir.path().join("models"),
            n_estimators: 3,
            ..TrainConfig::default()
        };
        let err = train(&cfg).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("cibil_score"));
        assert!(msg.contains("oops"));
        assert!(!dir.path().join("models").exists());
    }
}
