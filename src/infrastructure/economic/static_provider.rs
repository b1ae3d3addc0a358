use crate::domain::economic::{EconomicIndicators, Indicator};
use crate::domain::errors::EconomicDataError;
use crate::domain::ports::EconomicIndicatorProvider;
use async_trait::async_trait;
use std::collections::HashMap;

/// Serves a fixed set of observations; used offline and when no feed is configured.
#[derive(Debug, Clone)]
pub struct StaticIndicatorProvider {
    observations: HashMap<String, f64>,
}

impl StaticIndicatorProvider {
    pub fn new(observations: HashMap<String, f64>) -> Self {
        Self { observations }
    }

    pub fn from_indicators(indicators: &EconomicIndicators) -> Self {
        Self::new(
            Indicator::ALL
                .iter()
                .map(|i| (i.key().to_string(), indicators.get(*i)))
                .collect(),
        )
    }
}

impl Default for StaticIndicatorProvider {
    fn default() -> Self {
        Self::from_indicators(&EconomicIndicators::default())
    }
}

#[async_trait]
impl EconomicIndicatorProvider for StaticIndicatorProvider {
    async fn fetch_indicators(&self) -> Result<HashMap<String, f64>, EconomicDataError> {
        Ok(self.observations.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
