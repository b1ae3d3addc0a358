//! Bank of Canada Valet API adapter.
//!
//! One request fetches a few weeks of observations for every configured series:
//! `GET {base}/observations/{s1},{s2},.../json?recent_weeks=N`. Series publish on
//! different schedules (daily FX, weekly mortgage rates), so the newest value of
//! each series is picked out of the window.

use crate::domain::economic::Indicator;
use crate::domain::errors::EconomicDataError;
use crate::domain::ports::EconomicIndicatorProvider;
use crate::infrastructure::http_client_factory::HttpClientFactory;
use anyhow::Context;
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_VALET_URL: &str = "https://www.bankofcanada.ca/valet";
/// Wide enough to hold at least one observation of a weekly series.
pub const RECENT_WEEKS: u32 = 4;

/// Valet series id per indicator. Indicators without a series are left to defaults.
pub fn default_series() -> HashMap<Indicator, String> {
    HashMap::from([
        (Indicator::PolicyRate, "V39079".to_string()),
        (Indicator::PrimeRate, "V80691311".to_string()),
        (Indicator::MortgageRate5y, "V80691335".to_string()),
        (Indicator::ExchangeRate, "FXUSDCAD".to_string()),
    ])
}

#[derive(Debug, Deserialize)]
struct ValetResponse {
    #[serde(default)]
    observations: Vec<HashMap<String, serde_json::Value>>,
}

pub struct BankOfCanadaProvider {
    client: ClientWithMiddleware,
    base_url: String,
    series: HashMap<Indicator, String>,
}

impl std::fmt::Debug for BankOfCanadaProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankOfCanadaProvider")
            .field("base_url", &self.base_url)
            .field("series", &self.series)
            .finish()
    }
}

impl BankOfCanadaProvider {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self::with_series(base_url, request_timeout, default_series())
    }

    pub fn with_series(
        base_url: impl Into<String>,
        request_timeout: Duration,
        series: HashMap<Indicator, String>,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout, 2),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            series,
        }
    }

    fn observations_url(&self) -> String {
        let mut ids: Vec<&str> = self.series.values().map(String::as_str).collect();
        ids.sort_unstable();
        format!(
            "{}/observations/{}/json?recent_weeks={}",
            self.base_url,
            ids.join(","),
            RECENT_WEEKS
        )
    }

    async fn fetch_valet(&self) -> anyhow::Result<HashMap<String, f64>> {
        let url = self.observations_url();
        debug!("BankOfCanadaProvider: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send request to Bank of Canada Valet")?;

        if !response.status().is_success() {
            anyhow::bail!("Valet API returned status: {}", response.status());
        }

        let body: ValetResponse = response
            .json()
            .await
            .context("Failed to parse Valet response")?;

        let observations = parse_observations(&body, &self.series);
        info!(
            "BankOfCanadaProvider: fetched {}/{} series",
            observations.len(),
            self.series.len()
        );
        Ok(observations)
    }
}

/// Latest value per configured series, keyed by indicator name.
fn parse_observations(
    body: &ValetResponse,
    series: &HashMap<Indicator, String>,
) -> HashMap<String, f64> {
    let mut values = HashMap::new();
    for (indicator, series_id) in series {
        // Observations are date-ascending; take the newest that carries this series
        let latest = body.observations.iter().rev().find_map(|obs| {
            let raw = obs.get(series_id)?.get("v")?;
            match raw {
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                serde_json::Value::Number(n) => n.as_f64(),
                _ => None,
            }
        });
        if let Some(value) = latest.filter(|v| v.is_finite()) {
            values.insert(indicator.key().to_string(), value);
        }
    }
    values
}

#[async_trait]
impl EconomicIndicatorProvider for BankOfCanadaProvider {
    async fn fetch_indicators(&self) -> Result<HashMap<String, f64>, EconomicDataError> {
        self.fetch_valet()
            .await
            .map_err(|e| EconomicDataError::RequestFailed {
                reason: format!("{:#}", e),
            })
    }

    fn name(&self) -> &str {
        "bank_of_canada"
    }
}
