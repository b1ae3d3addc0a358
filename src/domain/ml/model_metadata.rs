use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Hold-out metrics recorded when a model was trained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPerformance {
    pub r2: f64,
    pub rmse: f64,
    #[serde(default)]
    pub mae: Option<f64>,
    /// Mean absolute percentage error, in percent.
    #[serde(default)]
    pub mape: Option<f64>,
}

/// Registry-wide training metadata (one file for all artifacts of a run).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryMetadata {
    pub training_date: DateTime<Utc>,
    pub best_model: String,
    #[serde(default)]
    pub performance: BTreeMap<String, ModelPerformance>,
    #[serde(default)]
    pub training_samples: Option<usize>,
}

/// One row of a performance comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelComparison {
    pub rank: usize,
    pub name: String,
    pub performance: ModelPerformance,
    pub is_best: bool,
    pub is_active: bool,
}

/// Validation thresholds a deployed model must meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerformanceThresholds {
    pub min_r2: f64,
    pub max_rmse: f64,
    pub max_mape: f64,
    pub max_age_days: i64,
}

impl Default for PerformanceThresholds {
    fn default() -> Self {
        Self {
            min_r2: 0.6,
            max_rmse: 500_000.0,
            max_mape: 20.0,
            max_age_days: 30,
        }
    }
}

impl PerformanceThresholds {
    /// Names of the metrics that fail their threshold.
    pub fn failing_metrics(&self, perf: &ModelPerformance) -> Vec<&'static str> {
        let mut failing = Vec::new();
        if perf.r2 < self.min_r2 {
            failing.push("r2");
        }
        if perf.rmse > self.max_rmse {
            failing.push("rmse");
        }
        if perf.mape.is_some_and(|m| m > self.max_mape) {
            failing.push("mape");
        }
        failing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failing_metrics() {
        let thresholds = PerformanceThresholds::default();
        let good = ModelPerformance {
            r2: 0.82,
            rmse: 120_000.0,
            mae: Some(80_000.0),
            mape: Some(11.0),
        };
        assert!(thresholds.failing_metrics(&good).is_empty());

        let bad = ModelPerformance {
            r2: 0.4,
            rmse: 650_000.0,
            mae: None,
            mape: Some(25.0),
        };
        assert_eq!(thresholds.failing_metrics(&bad), vec!["r2", "rmse", "mape"]);
    }

    #[test]
    fn test_metadata_deserializes_without_optional_fields() {
        let json = r#"{
            "training_date": "2026-09-01T00:00:00Z",
            "best_model": "random_forest"
        }"#;
        let metadata: RegistryMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.best_model, "random_forest");
        assert!(metadata.performance.is_empty());
    }
}
