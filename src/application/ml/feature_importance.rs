use super::model_registry::{ModelHandle, ModelRegistry};
use crate::domain::ml::feature_registry::{FEATURE_NAMES, FeatureCategory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportanceStatus {
    Available,
    /// The active model has no importance mechanism.
    Unsupported { model_type: String },
    NoModel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub rank: usize,
    pub name: String,
    pub category: FeatureCategory,
    /// Share of total importance, in [0, 1].
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryImportance {
    pub rank: usize,
    pub category: FeatureCategory,
    pub importance: f64,
    pub feature_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportanceReport {
    pub status: ImportanceStatus,
    pub model_name: Option<String>,
    pub features: Vec<FeatureImportance>,
    pub categories: Vec<CategoryImportance>,
}

impl FeatureImportanceReport {
    fn empty(status: ImportanceStatus, model_name: Option<String>) -> Self {
        Self {
            status,
            model_name,
            features: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == ImportanceStatus::Available
    }

    pub fn top(&self, n: usize) -> &[FeatureImportance] {
        &self.features[..n.min(self.features.len())]
    }
}

/// Explains the active model in terms of the canonical features.
#[derive(Debug, Clone)]
pub struct FeatureImportanceReporter {
    registry: Arc<ModelRegistry>,
}

impl FeatureImportanceReporter {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self { registry }
    }

    pub fn report(&self) -> FeatureImportanceReport {
        match self.registry.active() {
            Some(handle) => report_for(&handle),
            None => FeatureImportanceReport::empty(ImportanceStatus::NoModel, None),
        }
    }
}

fn report_for(handle: &ModelHandle) -> FeatureImportanceReport {
    let unsupported = || {
        FeatureImportanceReport::empty(
            ImportanceStatus::Unsupported {
                model_type: handle.model_type().to_string(),
            },
            Some(handle.name.clone()),
        )
    };

    if !handle.supports_importance() {
        return unsupported();
    }
    let Some(raw) = handle.canonical_importances() else {
        return unsupported();
    };

    let magnitudes: Vec<f64> = raw
        .iter()
        .map(|v| if v.is_finite() { v.abs() } else { 0.0 })
        .collect();
    let total: f64 = magnitudes.iter().sum();
    if total <= 0.0 {
        return unsupported();
    }

    let mut features: Vec<FeatureImportance> = magnitudes
        .iter()
        .enumerate()
        .map(|(i, v)| FeatureImportance {
            rank: 0,
            name: FEATURE_NAMES[i].to_string(),
            category: FeatureCategory::of_index(i),
            importance: v / total,
        })
        .collect();
    features.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, f) in features.iter_mut().enumerate() {
        f.rank = i + 1;
    }

    let mut categories: Vec<CategoryImportance> = FeatureCategory::ALL
        .iter()
        .map(|category| {
            let members = features.iter().filter(|f| f.category == *category);
            CategoryImportance {
                rank: 0,
                category: *category,
                importance: members.clone().map(|f| f.importance).sum(),
                feature_count: members.count(),
            }
        })
        .collect();
    categories.sort_by(|a, b| {
        b.importance
            .partial_cmp(&a.importance)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    for (i, c) in categories.iter_mut().enumerate() {
        c.rank = i + 1;
    }

    FeatureImportanceReport {
        status: ImportanceStatus::Available,
        model_name: Some(handle.name.clone()),
        features,
        categories,
    }
}
