//! Serialized model artifacts and their inference.
//!
//! Artifacts are a tagged union so that importance extraction is a capability
//! of each variant rather than runtime type inspection.

use super::predictor::ValuationModel;
use crate::domain::errors::ValuationError;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::RandomForestRegressor;
use smartcore::linalg::basic::matrix::DenseMatrix;

pub type Forest = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    Linear(LinearModel),
    RandomForest(ForestModel),
    Ensemble(EnsembleModel),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
pub struct ForestModel {
    pub model: Forest,
    /// Impurity importances exported at training time.
    #[serde(default)]
    pub feature_importances: Option<Vec<f64>>,
}

impl std::fmt::Debug for ForestModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForestModel")
            .field("model", &"<smartcore forest>")
            .field("feature_importances", &self.feature_importances)
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EnsembleModel {
    pub members: Vec<ModelArtifact>,
    /// Per-member weights; equal weighting when absent.
    #[serde(default)]
    pub weights: Option<Vec<f64>>,
}

impl ModelArtifact {
    /// Structural checks against the declared column count.
    pub fn validate(&self, feature_count: usize) -> Result<(), String> {
        match self {
            Self::Linear(linear) => {
                if linear.coefficients.len() != feature_count {
                    return Err(format!(
                        "linear model has {} coefficients for {} features",
                        linear.coefficients.len(),
                        feature_count
                    ));
                }
                if !linear.intercept.is_finite()
                    || linear.coefficients.iter().any(|c| !c.is_finite())
                {
                    return Err("linear model has non-finite parameters".to_string());
                }
                Ok(())
            }
            Self::RandomForest(forest) => match &forest.feature_importances {
                Some(imp) if imp.len() != feature_count => Err(format!(
                    "forest has {} importances for {} features",
                    imp.len(),
                    feature_count
                )),
                _ => Ok(()),
            },
            Self::Ensemble(ensemble) => {
                if ensemble.members.is_empty() {
                    return Err("ensemble has no members".to_string());
                }
                if let Some(weights) = &ensemble.weights {
                    if weights.len() != ensemble.members.len() {
                        return Err("ensemble weights do not match member count".to_string());
                    }
                    if weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                        || weights.iter().sum::<f64>() <= 0.0
                    {
                        return Err("ensemble weights must be non-negative".to_string());
                    }
                }
                ensemble
                    .members
                    .iter()
                    .try_for_each(|m| m.validate(feature_count))
            }
        }
    }

    fn member_weights(ensemble: &EnsembleModel) -> Vec<f64> {
        let raw = ensemble
            .weights
            .clone()
            .unwrap_or_else(|| vec![1.0; ensemble.members.len()]);
        let total: f64 = raw.iter().sum();
        raw.iter().map(|w| w / total).collect()
    }
}

fn normalized(values: &[f64]) -> Option<Vec<f64>> {
    let total: f64 = values.iter().map(|v| v.abs()).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    Some(values.iter().map(|v| v.abs() / total).collect())
}

impl ValuationModel for ModelArtifact {
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ValuationError> {
        match self {
            Self::Linear(linear) => rows
                .iter()
                .map(|row| {
                    if row.len() != linear.coefficients.len() {
                        return Err(ValuationError::InferenceFailed {
                            reason: format!(
                                "row has {} values, model expects {}",
                                row.len(),
                                linear.coefficients.len()
                            ),
                        });
                    }
                    Ok(linear.intercept
                        + row
                            .iter()
                            .zip(&linear.coefficients)
                            .map(|(x, w)| x * w)
                            .sum::<f64>())
                })
                .collect(),
            Self::RandomForest(forest) => {
                let matrix = DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(|e| {
                    ValuationError::InferenceFailed {
                        reason: format!("Matrix creation failed: {}", e),
                    }
                })?;
                let predictions =
                    forest
                        .model
                        .predict(&matrix)
                        .map_err(|e| ValuationError::InferenceFailed {
                            reason: format!("Prediction failed: {}", e),
                        })?;
                if predictions.len() != rows.len() {
                    return Err(ValuationError::InferenceFailed {
                        reason: "forest returned wrong number of predictions".to_string(),
                    });
                }
                Ok(predictions)
            }
            Self::Ensemble(ensemble) => {
                let weights = Self::member_weights(ensemble);
                let mut combined = vec![0.0; rows.len()];
                for (member, weight) in ensemble.members.iter().zip(weights) {
                    let predictions = member.predict_batch(rows)?;
                    for (acc, p) in combined.iter_mut().zip(predictions) {
                        *acc += weight * p;
                    }
                }
                Ok(combined)
            }
        }
    }

    fn supports_importance(&self) -> bool {
        match self {
            Self::Linear(_) => true,
            Self::RandomForest(forest) => forest.feature_importances.is_some(),
            Self::Ensemble(ensemble) => ensemble.members.iter().any(|m| m.supports_importance()),
        }
    }

    fn importances(&self) -> Option<Vec<f64>> {
        match self {
            Self::Linear(linear) => Some(linear.coefficients.iter().map(|c| c.abs()).collect()),
            Self::RandomForest(forest) => forest.feature_importances.clone(),
            Self::Ensemble(ensemble) => {
                // Average the normalised importances of members that have them
                let weights = Self::member_weights(ensemble);
                let mut combined: Option<Vec<f64>> = None;
                let mut weight_total = 0.0;
                for (member, weight) in ensemble.members.iter().zip(weights) {
                    let Some(member_imp) = member.importances().and_then(|v| normalized(&v))
                    else {
                        continue;
                    };
                    let acc = combined.get_or_insert_with(|| vec![0.0; member_imp.len()]);
                    if acc.len() != member_imp.len() {
                        continue;
                    }
                    for (a, v) in acc.iter_mut().zip(member_imp) {
                        *a += weight * v;
                    }
                    weight_total += weight;
                }
                combined
                    .filter(|_| weight_total > 0.0)
                    .map(|acc| acc.into_iter().map(|v| v / weight_total).collect())
            }
        }
    }

    fn model_type(&self) -> &str {
        match self {
            Self::Linear(_) => "linear",
            Self::RandomForest(_) => "random_forest",
            Self::Ensemble(_) => "ensemble",
        }
    }
}
