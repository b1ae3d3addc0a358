use crate::domain::errors::EconomicDataError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Source of raw macroeconomic observations.
///
/// Implementations return a flat map keyed by [`Indicator::key`]; indicators
/// they cannot supply are simply left out.
///
/// [`Indicator::key`]: crate::domain::economic::Indicator::key
#[async_trait]
pub trait EconomicIndicatorProvider: Send + Sync {
    async fn fetch_indicators(&self) -> Result<HashMap<String, f64>, EconomicDataError>;

    fn name(&self) -> &str;
}
