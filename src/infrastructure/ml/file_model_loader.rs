use crate::application::ml::model_artifact::ModelArtifact;
use crate::application::ml::predictor::{LoadedModel, ModelLoader};
use crate::domain::errors::ValuationError;
use crate::domain::ml::model_metadata::RegistryMetadata;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const METADATA_FILE: &str = "model_metadata.json";

/// On-disk form of one model: `<dir>/<name>.json`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactFile {
    pub feature_names: Vec<String>,
    pub model: ModelArtifact,
}

/// Loads JSON artifacts from a directory.
#[derive(Debug, Clone)]
pub struct FileModelLoader {
    dir: PathBuf,
}

impl FileModelLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn artifact_path(&self, name: &str) -> Option<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !name.starts_with('.');
        valid.then(|| self.dir.join(format!("{}.json", name)))
    }
}

impl ModelLoader for FileModelLoader {
    fn load(&self, name: &str) -> Result<LoadedModel, ValuationError> {
        let path = self
            .artifact_path(name)
            .filter(|p| p.is_file())
            .ok_or_else(|| ValuationError::ModelNotFound {
                name: name.to_string(),
            })?;

        let invalid = |reason: String| ValuationError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        let raw = fs::read_to_string(&path).map_err(|e| invalid(format!("read failed: {}", e)))?;
        let file: ArtifactFile =
            serde_json::from_str(&raw).map_err(|e| invalid(format!("parse failed: {}", e)))?;
        file.model
            .validate(file.feature_names.len())
            .map_err(invalid)?;

        info!("FileModelLoader: Loaded model '{}' from {:?}", name, path);
        Ok(LoadedModel {
            model: Arc::new(file.model),
            feature_names: file.feature_names,
        })
    }

    fn list_available(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("FileModelLoader: cannot read {:?}: {}", self.dir, e);
                return Vec::new();
            }
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter(|path| path.file_name().is_some_and(|f| f != METADATA_FILE))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn metadata(&self) -> Option<RegistryMetadata> {
        let path = self.dir.join(METADATA_FILE);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!("FileModelLoader: ignoring malformed {:?}: {}", path, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES};
    use std::path::Path;

    fn write_linear(dir: &Path, name: &str, coefficients: usize) {
        let body = serde_json::json!({
            "feature_names": FEATURE_NAMES,
            "model": {
                "kind": "linear",
                "intercept": 250000.0,
                "coefficients": vec![1.0; coefficients],
            }
        });
        fs::write(dir.join(format!("{}.json", name)), body.to_string()).unwrap();
    }

    #[test]
    fn test_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        write_linear(dir.path(), "linear", FEATURE_COUNT);
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loader = FileModelLoader::new(dir.path());
        assert_eq!(loader.list_available(), vec!["linear".to_string()]);

        let loaded = loader.load("linear").unwrap();
        assert_eq!(loaded.feature_names.len(), FEATURE_COUNT);
        assert_eq!(loaded.model.model_type(), "linear");
    }

    #[test]
    fn test_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_linear(dir.path(), "short", 10);
        fs::write(dir.path().join("garbage.json"), "{not json").unwrap();
        let loader = FileModelLoader::new(dir.path());

        assert!(matches!(
            loader.load("absent"),
            Err(ValuationError::ModelNotFound { .. })
        ));
        assert!(matches!(
            loader.load("../etc/passwd"),
            Err(ValuationError::ModelNotFound { .. })
        ));
        assert!(matches!(
            loader.load("garbage"),
            Err(ValuationError::InvalidArtifact { .. })
        ));
        assert!(matches!(
            loader.load("short"),
            Err(ValuationError::InvalidArtifact { .. })
        ));
    }

    #[test]
    fn test_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let loader = FileModelLoader::new(dir.path());
        assert!(loader.metadata().is_none());

        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{
                "training_date": "2026-10-01T00:00:00Z",
                "best_model": "linear",
                "performance": {"linear": {"r2": 0.71, "rmse": 180000.0}}
            }"#,
        )
        .unwrap();
        let metadata = loader.metadata().unwrap();
        assert_eq!(metadata.best_model, "linear");
        assert_eq!(metadata.performance["linear"].r2, 0.71);
        assert!(loader.list_available().is_empty());
    }
}
