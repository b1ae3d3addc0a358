//! In-memory collaborators for tests and offline runs.

use crate::application::ml::predictor::{LoadedModel, ModelLoader, ValuationModel};
use crate::domain::economic::{EconomicIndicators, Indicator};
use crate::domain::errors::{EconomicDataError, ValuationError};
use crate::domain::ml::feature_registry::FEATURE_NAMES;
use crate::domain::ml::model_metadata::RegistryMetadata;
use crate::domain::ports::EconomicIndicatorProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Indicator provider with scriptable values, failures and latency.
#[derive(Debug)]
pub struct MockIndicatorProvider {
    values: Mutex<HashMap<String, f64>>,
    delay: Mutex<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockIndicatorProvider {
    pub fn new(values: HashMap<String, f64>) -> Self {
        Self {
            values: Mutex::new(values),
            delay: Mutex::new(Duration::ZERO),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// All seven indicators at their defaults, except the policy rate.
    pub fn with_policy_rate(policy_rate: f64) -> Self {
        let indicators = EconomicIndicators {
            policy_rate,
            ..Default::default()
        };
        Self::new(
            Indicator::ALL
                .iter()
                .map(|i| (i.key().to_string(), indicators.get(*i)))
                .collect(),
        )
    }

    pub fn set(&self, key: &str, value: f64) {
        let mut values = self.values.lock().unwrap_or_else(|p| p.into_inner());
        values.insert(key.to_string(), value);
    }

    /// While set, every fetch fails.
    pub fn fail_next(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|p| p.into_inner()) = delay;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EconomicIndicatorProvider for MockIndicatorProvider {
    async fn fetch_indicators(&self) -> Result<HashMap<String, f64>, EconomicDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(|p| p.into_inner());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(EconomicDataError::RequestFailed {
                reason: "mock provider failure".to_string(),
            });
        }
        Ok(self.values.lock().unwrap_or_else(|p| p.into_inner()).clone())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Provider that always errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingIndicatorProvider;

#[async_trait]
impl EconomicIndicatorProvider for FailingIndicatorProvider {
    async fn fetch_indicators(&self) -> Result<HashMap<String, f64>, EconomicDataError> {
        Err(EconomicDataError::RequestFailed {
            reason: "provider unavailable".to_string(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[derive(Debug, Clone, Copy)]
enum MockBehaviour {
    Constant(f64),
    FirstColumnTimes(f64),
    Failing,
}

/// Deterministic stand-in for a trained model.
#[derive(Debug, Clone)]
pub struct MockValuationModel {
    behaviour: MockBehaviour,
    importances: Option<Vec<f64>>,
}

impl MockValuationModel {
    pub fn constant(price: f64) -> Self {
        Self {
            behaviour: MockBehaviour::Constant(price),
            importances: None,
        }
    }

    /// Predicts `factor` times the first declared column.
    pub fn first_column_times(factor: f64) -> Self {
        Self {
            behaviour: MockBehaviour::FirstColumnTimes(factor),
            importances: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            behaviour: MockBehaviour::Failing,
            importances: None,
        }
    }

    pub fn with_importances(mut self, importances: Vec<f64>) -> Self {
        self.importances = Some(importances);
        self
    }
}

impl ValuationModel for MockValuationModel {
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, ValuationError> {
        match self.behaviour {
            MockBehaviour::Constant(price) => Ok(vec![price; rows.len()]),
            MockBehaviour::FirstColumnTimes(factor) => Ok(rows
                .iter()
                .map(|row| row.first().copied().unwrap_or(0.0) * factor)
                .collect()),
            MockBehaviour::Failing => Err(ValuationError::InferenceFailed {
                reason: "mock model failure".to_string(),
            }),
        }
    }

    fn supports_importance(&self) -> bool {
        self.importances.is_some()
    }

    fn importances(&self) -> Option<Vec<f64>> {
        self.importances.clone()
    }

    fn model_type(&self) -> &str {
        "mock"
    }
}

/// Loader over an in-memory set of models.
#[derive(Clone, Default)]
pub struct MockModelLoader {
    models: HashMap<String, LoadedModel>,
    metadata: Option<RegistryMetadata>,
}

impl std::fmt::Debug for MockModelLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockModelLoader")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MockModelLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model that declares the canonical feature order.
    pub fn with_model(self, name: &str, model: impl ValuationModel + 'static) -> Self {
        let names = FEATURE_NAMES.iter().map(|s| s.to_string()).collect();
        self.with_named_model(name, model, names)
    }

    pub fn with_named_model(
        mut self,
        name: &str,
        model: impl ValuationModel + 'static,
        feature_names: Vec<String>,
    ) -> Self {
        self.models.insert(
            name.to_string(),
            LoadedModel {
                model: Arc::new(model),
                feature_names,
            },
        );
        self
    }

    pub fn with_metadata(mut self, metadata: RegistryMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl ModelLoader for MockModelLoader {
    fn load(&self, name: &str) -> Result<LoadedModel, ValuationError> {
        self.models
            .get(name)
            .cloned()
            .ok_or_else(|| ValuationError::ModelNotFound {
                name: name.to_string(),
            })
    }

    fn list_available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }

    fn metadata(&self) -> Option<RegistryMetadata> {
        self.metadata.clone()
    }
}
