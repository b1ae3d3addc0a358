use crate::domain::errors::ValuationError;
use crate::domain::ml::model_metadata::RegistryMetadata;
use std::sync::Arc;

/// Interface for pre-trained price regression models.
pub trait ValuationModel: Send + Sync {
    /// Predict one price per row. Rows are already in the model's declared
    /// column order.
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ValuationError>;

    /// Whether the model can report per-feature importances.
    fn supports_importance(&self) -> bool {
        false
    }

    /// Raw per-column importances in declared column order (not normalised).
    fn importances(&self) -> Option<Vec<f64>> {
        None
    }

    /// Model family, e.g. "random_forest".
    fn model_type(&self) -> &str;
}

/// A model together with the column order it was trained on.
#[derive(Clone)]
pub struct LoadedModel {
    pub model: Arc<dyn ValuationModel>,
    pub feature_names: Vec<String>,
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("model_type", &self.model.model_type())
            .field("feature_names", &self.feature_names.len())
            .finish()
    }
}

/// Source of named model artifacts.
pub trait ModelLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<LoadedModel, ValuationError>;

    fn list_available(&self) -> Vec<String>;

    /// Training metadata shared by the available artifacts, if recorded.
    fn metadata(&self) -> Option<RegistryMetadata>;
}
