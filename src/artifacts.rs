//! Artifact bundle persistence.
//!
//! The bundle is five named blobs, mirroring the files the training run
//! produces: classifier, scaler, encoding registry, feature schema and
//! target column name. They are written only after every fit step has
//! succeeded, staged as temp files and renamed into place as a set, and loaded
//! all-or-nothing: a partial or internally inconsistent bundle is rejected
//! as a whole.
//!
//! The schema blob carries a format version so a bundle produced by an
//! incompatible generation of this crate is refused at load instead of
//! silently mis-decoding.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::encoding::EncodingRegistry;
use crate::error::PipelineError;
use crate::forest::FittedRandomForest;
use crate::scaling::FittedStandardScaler;
use crate::schema::FeatureSchema;

/// Bumped on any change to blob layout or encoding semantics.
pub const FORMAT_VERSION: u32 = 1;

/// Blob file names inside the artifact directory.
pub const MODEL_FILE: &str = "loan_model.bin";
pub const SCALER_FILE: &str = "scaler.bin";
pub const ENCODERS_FILE: &str = "label_encoders.bin";
pub const SCHEMA_FILE: &str = "feature_names.bin";
pub const TARGET_FILE: &str = "target_name.bin";

#[derive(Serialize, Deserialize)]
struct SchemaBlob {
    format_version: u32,
    features: Vec<String>,
}

/// Everything inference needs, created once by a training run and treated
/// as immutable until the next retraining replaces it wholesale.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ArtifactBundle {
    pub model: FittedRandomForest,
    pub scaler: FittedStandardScaler,
    pub encoders: EncodingRegistry,
    pub schema: FeatureSchema,
    pub target_column: String,
}

impl ArtifactBundle {
    /// Persist the bundle into `dir` as five blob files.
    ///
    /// The save is two-phase: all blobs are serialized in memory, then all
    /// five are staged as `.tmp` siblings, and only after every write has
    /// succeeded are they renamed into place. A failure during the write
    /// phase leaves any existing bundle untouched, so a serving process can
    /// never observe a mix of blob generations.
    ///
    /// # Errors
    /// [`PipelineError::Serialization`] or [`PipelineError::Io`].
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<(), PipelineError> {
        let dir = dir.as_ref();

        let schema_blob = SchemaBlob {
            format_version: FORMAT_VERSION,
            features: self.schema.features().to_vec(),
        };
        let blobs: [(&str, Vec<u8>); 5] = [
            (MODEL_FILE, bincode::serialize(&self.model)?),
            (SCALER_FILE, bincode::serialize(&self.scaler)?),
            (ENCODERS_FILE, bincode::serialize(&self.encoders)?),
            (SCHEMA_FILE, bincode::serialize(&schema_blob)?),
            (TARGET_FILE, bincode::serialize(&self.target_column)?),
        ];

        fs::create_dir_all(dir)?;

        let mut staged = Vec::with_capacity(blobs.len());
        for (name, bytes) in &blobs {
            let target = dir.join(name);
            let tmp = tmp_path(&target);
            if let Err(err) = fs::write(&tmp, bytes) {
                for (tmp, _) in &staged {
                    let _ = fs::remove_file(tmp);
                }
                return Err(err.into());
            }
            staged.push((tmp, target));
        }
        for (tmp, target) in staged {
            fs::rename(&tmp, &target)?;
        }
        Ok(())
    }

    /// Load a bundle from `dir`.
    ///
    /// # Errors
    /// [`PipelineError::ArtifactLoad`] if any blob is missing, unreadable,
    /// from another format version, or the blobs are mutually inconsistent.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, PipelineError> {
        let dir = dir.as_ref();

        let model: FittedRandomForest = read_blob(dir, MODEL_FILE)?;
        let scaler: FittedStandardScaler = read_blob(dir, SCALER_FILE)?;
        let encoders: EncodingRegistry = read_blob(dir, ENCODERS_FILE)?;
        let schema_blob: SchemaBlob = read_blob(dir, SCHEMA_FILE)?;
        let target_column: String = read_blob(dir, TARGET_FILE)?;

        if schema_blob.format_version != FORMAT_VERSION {
            return Err(PipelineError::ArtifactLoad(format!(
                "artifact format version {} is not supported (expected {})",
                schema_blob.format_version, FORMAT_VERSION
            )));
        }
        let schema = FeatureSchema::from_features(schema_blob.features);

        let bundle = Self {
            model,
            scaler,
            encoders,
            schema,
            target_column,
        };
        bundle.check_consistency()?;
        Ok(bundle)
    }

    /// Cross-blob sanity checks: the feature counts of schema, scaler and
    /// model must agree, and the target column must have an encoder whose
    /// class count matches the model.
    fn check_consistency(&self) -> Result<(), PipelineError> {
        let n = self.schema.len();
        if self.scaler.n_features() != n || self.model.n_features() != n {
            return Err(PipelineError::ArtifactLoad(format!(
                "inconsistent bundle: schema has {} features, scaler {}, model {}",
                n,
                self.scaler.n_features(),
                self.model.n_features()
            )));
        }
        match self.encoders.encoder(&self.target_column) {
            Some(encoder) if encoder.n_classes() == self.model.n_classes() => Ok(()),
            Some(encoder) => Err(PipelineError::ArtifactLoad(format!(
                "inconsistent bundle: target encoder has {} classes, model {}",
                encoder.n_classes(),
                self.model.n_classes()
            ))),
            None => Err(PipelineError::ArtifactLoad(format!(
                "inconsistent bundle: no encoder for target column '{}'",
                self.target_column
            ))),
        }
    }
}

fn tmp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    target.with_file_name(name)
}

fn read_blob<T: for<'de> Deserialize<'de>>(dir: &Path, name: &str) -> Result<T, PipelineError> {
    let path = dir.join(name);
    let bytes = fs::read(&path).map_err(|err| {
        PipelineError::ArtifactLoad(format!("cannot read {}: {}", path.display(), err))
    })?;
    bincode::deserialize(&bytes).map_err(|err| {
        PipelineError::ArtifactLoad(format!("cannot decode {}: {}", path.display(), err))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::RandomForestClassifier;
    use crate::scaling::StandardScaler;
    use ndarray::array;

    fn bundle() -> ArtifactBundle {
        let x = array![[0.0, 10.0], [0.1, 20.0], [1.0, 30.0], [1.1, 40.0]];
        let y = vec![0, 0, 1, 1];
        let scaler = StandardScaler::new().fit(&x).unwrap();
        let scaled = scaler.transform_matrix(&x).unwrap();
        let model = RandomForestClassifier::new(5).fit(&scaled, &y, 2).unwrap();

        let mut encoders = EncodingRegistry::new();
        encoders
            .fit_column("loan_status", ["approved", "rejected"])
            .unwrap();

        ArtifactBundle {
            model,
            scaler,
            encoders,
            schema: FeatureSchema::from_features(vec![
                "cibil_score".to_string(),
                "income_annum".to_string(),
            ]),
            target_column: "loan_status".to_string(),
        }
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let original = bundle();
        original.save(dir.path()).unwrap();

        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.schema, original.schema);
        assert_eq!(loaded.encoders, original.encoders);
        assert_eq!(loaded.target_column, "loan_status");
        assert_eq!(loaded.model.n_trees(), original.model.n_trees());
        assert_eq!(
            loaded.model.predict(&[0.0, 0.0]).unwrap(),
            original.model.predict(&[0.0, 0.0]).unwrap()
        );
    }

    #[test]
    fn test_save_leaves_no_tmp_files() {
        let dir = tempfile::tempdir().unwrap();
        bundle().save(dir.path()).unwrap();
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| !n.ends_with(".tmp")));
    }

    #[test]
    fn test_failed_save_keeps_previous_bundle_intact() {
        let dir = tempfile::tempdir().unwrap();
        let original = bundle();
        original.save(dir.path()).unwrap();
        let before: Vec<Vec<u8>> = [MODEL_FILE, SCALER_FILE, ENCODERS_FILE, SCHEMA_FILE, TARGET_FILE]
            .iter()
            .map(|name| fs::read(dir.path().join(name)).unwrap())
            .collect();

        // force a failure mid write phase: the scaler's staging path is
        // unwritable, so the save must abort before any rename happens
        fs::create_dir(dir.path().join("scaler.bin.tmp")).unwrap();
        let mut newer = bundle();
        newer.model = {
            let x = array![[0.0, 10.0], [0.1, 20.0], [1.0, 30.0], [1.1, 40.0]];
            let y = vec![0, 0, 1, 1];
            let scaler = StandardScaler::new().fit(&x).unwrap();
            let scaled = scaler.transform_matrix(&x).unwrap();
            RandomForestClassifier::new(7)
                .with_seed(99)
                .fit(&scaled, &y, 2)
                .unwrap()
        };
        assert!(newer.save(dir.path()).is_err());

        // no blob of the old generation was replaced, and the bundle still
        // loads as a consistent whole
        for (name, expected) in [MODEL_FILE, SCALER_FILE, ENCODERS_FILE, SCHEMA_FILE, TARGET_FILE]
            .iter()
            .zip(&before)
        {
            let actual = fs::read(dir.path().join(name)).unwrap();
            assert_eq!(&actual, expected, "blob {} changed after a failed save", name);
        }
        let loaded = ArtifactBundle::load(dir.path()).unwrap();
        assert_eq!(loaded.model.n_trees(), original.model.n_trees());
    }

    #[test]
    fn test_failed_save_cleans_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("scaler.bin.tmp")).unwrap();
        assert!(bundle().save(dir.path()).is_err());
        // the model blob staged before the failure must not be left behind
        assert!(!dir.path().join("loan_model.bin.tmp").exists());
        assert!(!dir.path().join(MODEL_FILE).exists());
    }

    #[test]
    fn test_partial_bundle_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::remove_file(dir.path().join(SCALER_FILE)).unwrap();

        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad(_)));
        assert!(err.to_string().contains(SCALER_FILE));
    }

    #[test]
    fn test_corrupt_blob_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        bundle().save(dir.path()).unwrap();
        fs::write(dir.path().join(MODEL_FILE), b"garbage").unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad(_)));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        bundle().save(dir.path()).unwrap();
        let blob = SchemaBlob {
            format_version: FORMAT_VERSION + 1,
            features: vec!["cibil_score".to_string(), "income_annum".to_string()],
        };
        fs::write(
            dir.path().join(SCHEMA_FILE),
            bincode::serialize(&blob).unwrap(),
        )
        .unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("format version"));
    }

    #[test]
    fn test_inconsistent_feature_counts_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut original = bundle();
        original.schema = FeatureSchema::from_features(vec!["cibil_score".to_string()]);
        original.save(dir.path()).unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::ArtifactLoad(_)));
    }

    #[test]
    fn test_missing_target_encoder_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut original = bundle();
        original.target_column = "status".to_string();
        original.save(dir.path()).unwrap();
        let err = ArtifactBundle::load(dir.path()).unwrap_err();
        assert!(err.to_string().contains("status"));
    }
}
