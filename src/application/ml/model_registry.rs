use super::feature_assembler::FeatureAssembler;
use super::predictor::{LoadedModel, ModelLoader, ValuationModel};
use crate::domain::economic::EconomicSnapshot;
use crate::domain::errors::ValuationError;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FeatureVector, feature_index};
use crate::domain::ml::model_metadata::{
    ModelComparison, ModelPerformance, PerformanceThresholds, RegistryMetadata,
};
use chrono::{DateTime, Utc};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// A validated model ready for inference.
pub struct ModelHandle {
    pub name: String,
    model: Arc<dyn ValuationModel>,
    /// Column order declared by the artifact.
    pub feature_names: Vec<String>,
    /// For each declared column, its canonical slot.
    column_order: Vec<usize>,
    pub metadata: Option<RegistryMetadata>,
    pub loaded_at: DateTime<Utc>,
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle")
            .field("name", &self.name)
            .field("model_type", &self.model.model_type())
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

impl ModelHandle {
    fn build(name: &str, loaded: LoadedModel) -> Result<Self, ValuationError> {
        let invalid = |reason: String| ValuationError::InvalidArtifact {
            name: name.to_string(),
            reason,
        };

        if loaded.feature_names.len() != FEATURE_COUNT {
            return Err(invalid(format!(
                "declares {} features, expected {}",
                loaded.feature_names.len(),
                FEATURE_COUNT
            )));
        }

        let mut column_order = Vec::with_capacity(FEATURE_COUNT);
        let mut seen = [false; FEATURE_COUNT];
        for declared in &loaded.feature_names {
            let index = feature_index(declared)
                .ok_or_else(|| invalid(format!("unknown feature '{}'", declared)))?;
            if seen[index] {
                return Err(invalid(format!("duplicate feature '{}'", declared)));
            }
            seen[index] = true;
            column_order.push(index);
        }

        Ok(Self {
            name: name.to_string(),
            model: loaded.model,
            feature_names: loaded.feature_names,
            column_order,
            metadata: None,
            loaded_at: Utc::now(),
        })
    }

    pub fn model_type(&self) -> &str {
        self.model.model_type()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<f64, ValuationError> {
        let row = features.reordered(&self.column_order);
        let out = self.model.predict_batch(&[row])?;
        out.first()
            .copied()
            .ok_or_else(|| ValuationError::InferenceFailed {
                reason: "model returned no prediction".to_string(),
            })
    }

    pub fn supports_importance(&self) -> bool {
        self.model.supports_importance()
    }

    /// Raw importances mapped back to canonical slot order.
    pub fn canonical_importances(&self) -> Option<Vec<f64>> {
        let declared = self.model.importances()?;
        if declared.len() != FEATURE_COUNT {
            return None;
        }
        let mut canonical = vec![0.0; FEATURE_COUNT];
        for (value, slot) in declared.into_iter().zip(&self.column_order) {
            canonical[*slot] = value;
        }
        Some(canonical)
    }

    pub fn performance(&self) -> Option<ModelPerformance> {
        self.metadata
            .as_ref()
            .and_then(|m| m.performance.get(&self.name).copied())
    }
}

/// Owns zero or one active model and swaps it atomically.
///
/// A new artifact is fully validated (feature names, canary inference) before
/// it replaces the active handle; a failed load leaves the previous one serving.
pub struct ModelRegistry {
    loader: Arc<dyn ModelLoader>,
    active: RwLock<Option<Arc<ModelHandle>>>,
    thresholds: PerformanceThresholds,
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("active", &self.active().map(|h| h.name.clone()))
            .field("thresholds", &self.thresholds)
            .finish()
    }
}

impl ModelRegistry {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self::with_thresholds(loader, PerformanceThresholds::default())
    }

    pub fn with_thresholds(
        loader: Arc<dyn ModelLoader>,
        thresholds: PerformanceThresholds,
    ) -> Self {
        Self {
            loader,
            active: RwLock::new(None),
            thresholds,
        }
    }

    /// Load, validate and publish `name`. Returns false (keeping the previous
    /// model) on any failure.
    pub fn load(&self, name: &str) -> bool {
        match self.try_load(name) {
            Ok(handle) => {
                info!(
                    "ModelRegistry: activated '{}' ({})",
                    handle.name,
                    handle.model_type()
                );
                self.publish(Some(Arc::new(handle)));
                true
            }
            Err(e) => {
                warn!(
                    "ModelRegistry: failed to load '{}': {}. Keeping {}",
                    name,
                    e,
                    self.active()
                        .map(|h| format!("'{}'", h.name))
                        .unwrap_or_else(|| "no model".to_string())
                );
                false
            }
        }
    }

    /// Load the model named as best in the training metadata.
    pub fn load_best(&self) -> bool {
        match self.loader.metadata() {
            Some(metadata) => self.load(&metadata.best_model),
            None => {
                warn!("ModelRegistry: no metadata, cannot determine best model");
                false
            }
        }
    }

    fn try_load(&self, name: &str) -> Result<ModelHandle, ValuationError> {
        let loaded = self.loader.load(name)?;
        let mut handle = ModelHandle::build(name, loaded)?;

        let canary =
            FeatureAssembler::canary(&EconomicSnapshot::defaults(), Utc::now().date_naive());
        let output = handle.predict(&canary)?;
        if !output.is_finite() || output <= 0.0 {
            return Err(ValuationError::InvalidArtifact {
                name: name.to_string(),
                reason: format!("canary inference produced {}", output),
            });
        }

        handle.metadata = self.loader.metadata();
        Ok(handle)
    }

    pub fn unload(&self) {
        if let Some(previous) = self.active() {
            info!("ModelRegistry: unloaded '{}'", previous.name);
        }
        self.publish(None);
    }

    pub fn active(&self) -> Option<Arc<ModelHandle>> {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn list_available(&self) -> Vec<String> {
        self.loader.list_available()
    }

    pub fn metadata(&self) -> Option<RegistryMetadata> {
        self.loader.metadata()
    }

    /// Models with recorded performance, best R² first.
    pub fn compare(&self) -> Vec<ModelComparison> {
        let Some(metadata) = self.loader.metadata() else {
            return Vec::new();
        };
        let active_name = self.active().map(|h| h.name.clone());

        let mut rows: Vec<(&String, &ModelPerformance)> = metadata.performance.iter().collect();
        rows.sort_by(|a, b| {
            b.1.r2
                .partial_cmp(&a.1.r2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });

        rows.into_iter()
            .enumerate()
            .map(|(i, (name, performance))| ModelComparison {
                rank: i + 1,
                name: name.clone(),
                performance: *performance,
                is_best: *name == metadata.best_model,
                is_active: active_name.as_deref() == Some(name.as_str()),
            })
            .collect()
    }

    /// Whether the deployed model is stale or underperforming.
    pub fn retrain_recommended(&self, now: DateTime<Utc>) -> bool {
        let Some(metadata) = self.loader.metadata() else {
            return true;
        };

        if (now - metadata.training_date).num_days() > self.thresholds.max_age_days {
            info!(
                "ModelRegistry: models trained {} are older than {} days",
                metadata.training_date, self.thresholds.max_age_days
            );
            return true;
        }

        let evaluated = self
            .active()
            .map(|h| h.name.clone())
            .unwrap_or_else(|| metadata.best_model.clone());
        match metadata.performance.get(&evaluated) {
            Some(perf) => {
                let failing = self.thresholds.failing_metrics(perf);
                if !failing.is_empty() {
                    info!(
                        "ModelRegistry: '{}' fails thresholds on {:?}",
                        evaluated, failing
                    );
                }
                !failing.is_empty()
            }
            None => true,
        }
    }

    fn publish(&self, handle: Option<Arc<ModelHandle>>) {
        match self.active.write() {
            Ok(mut guard) => *guard = handle,
            Err(poisoned) => {
                tracing::error!("ModelRegistry: lock poisoned during swap, recovering");
                *poisoned.into_inner() = handle;
            }
        }
    }
}
