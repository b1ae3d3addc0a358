use super::model_registry::ModelRegistry;
use super::statistical_estimator::{PropertyHints, StatisticalEstimator};
use crate::domain::errors::ValuationError;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FeatureVector};
use crate::domain::valuation::{
    ConfidenceInterval, Degradation, PredictionMethod, PredictionResult, clamp_price, summarize,
};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_INTERVAL_PCT: f64 = 0.15;
pub const MODEL_CONFIDENCE: f64 = 0.85;
pub const STATISTICAL_CONFIDENCE: f64 = 0.75;

/// Model-first price prediction with a deterministic statistical fallback.
///
/// Always produces a price within the global bounds; why the result is
/// degraded (no model, failed inference, clamping) travels with it.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    registry: Arc<ModelRegistry>,
    estimator: StatisticalEstimator,
    interval_pct: f64,
}

impl PredictionEngine {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self::with_interval(registry, DEFAULT_INTERVAL_PCT)
    }

    pub fn with_interval(registry: Arc<ModelRegistry>, interval_pct: f64) -> Self {
        let interval_pct = if interval_pct.is_finite() && interval_pct >= 0.0 {
            interval_pct
        } else {
            DEFAULT_INTERVAL_PCT
        };
        Self {
            registry,
            estimator: StatisticalEstimator::new(),
            interval_pct,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn interval_pct(&self) -> f64 {
        self.interval_pct
    }

    pub fn predict(&self, features: &FeatureVector, hints: &PropertyHints) -> PredictionResult {
        let mut degradations = Vec::new();

        let from_model = match self.registry.active() {
            Some(handle) => match handle.predict(features) {
                Ok(price) if price.is_finite() && price > 0.0 => Some((price, handle.name.clone())),
                Ok(price) => {
                    warn!(
                        "PredictionEngine: model '{}' returned {}, using statistical fallback",
                        handle.name, price
                    );
                    degradations.push(Degradation::InferenceFailed(format!(
                        "implausible output {}",
                        price
                    )));
                    None
                }
                Err(e) => {
                    warn!(
                        "PredictionEngine: model '{}' failed ({}), using statistical fallback",
                        handle.name, e
                    );
                    degradations.push(Degradation::InferenceFailed(e.to_string()));
                    None
                }
            },
            None => {
                degradations.push(Degradation::NoModelLoaded);
                None
            }
        };

        let (raw, method, model_name, confidence) = match from_model {
            Some((price, name)) => (price, PredictionMethod::Model, Some(name), MODEL_CONFIDENCE),
            None => {
                let estimate = self.estimator.estimate(features, hints);
                debug!(
                    "PredictionEngine: statistical estimate {:.0} (base {:.0}, adj {:.0}, x{:.3})",
                    estimate.price,
                    estimate.base_price,
                    estimate.adjustments,
                    estimate.market_factor
                );
                (
                    estimate.price,
                    PredictionMethod::Statistical,
                    None,
                    STATISTICAL_CONFIDENCE,
                )
            }
        };

        // A non-finite estimate can only come from non-finite overrides
        let raw = if raw.is_finite() { raw } else { 0.0 };
        let predicted_price = clamp_price(raw);
        if predicted_price != raw {
            degradations.push(Degradation::PriceClamped { raw });
        }

        PredictionResult {
            predicted_price,
            confidence,
            confidence_interval: ConfidenceInterval::around(predicted_price, self.interval_pct),
            method,
            feature_count: FEATURE_COUNT,
            model_name,
            error: summarize(&degradations),
            degradations,
        }
    }

    /// Predict from an unchecked slice in canonical order.
    pub fn predict_raw(&self, values: &[f64]) -> Result<PredictionResult, ValuationError> {
        let features = FeatureVector::try_from(values)?;
        Ok(self.predict(&features, &PropertyHints::default()))
    }
}
