//! Macroeconomic indicators and the composite indices derived from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The seven raw indicators tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    PolicyRate,
    PrimeRate,
    MortgageRate5y,
    InflationRate,
    UnemploymentRate,
    ExchangeRate,
    GdpGrowth,
}

impl Indicator {
    pub const ALL: [Indicator; 7] = [
        Indicator::PolicyRate,
        Indicator::PrimeRate,
        Indicator::MortgageRate5y,
        Indicator::InflationRate,
        Indicator::UnemploymentRate,
        Indicator::ExchangeRate,
        Indicator::GdpGrowth,
    ];

    /// Key used in the flat name → value maps returned by providers.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PolicyRate => "policy_rate",
            Self::PrimeRate => "prime_rate",
            Self::MortgageRate5y => "mortgage_rate_5y",
            Self::InflationRate => "inflation_rate",
            Self::UnemploymentRate => "unemployment_rate",
            Self::ExchangeRate => "exchange_rate",
            Self::GdpGrowth => "gdp_growth",
        }
    }

    pub fn default_value(&self) -> f64 {
        match self {
            Self::PolicyRate => 5.0,
            Self::PrimeRate => 7.2,
            Self::MortgageRate5y => 6.5,
            Self::InflationRate => 2.3,
            Self::UnemploymentRate => 5.2,
            Self::ExchangeRate => 1.37,
            Self::GdpGrowth => 1.8,
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Raw indicator values, in percent except for the exchange rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EconomicIndicators {
    pub policy_rate: f64,
    pub prime_rate: f64,
    pub mortgage_rate_5y: f64,
    pub inflation_rate: f64,
    pub unemployment_rate: f64,
    pub exchange_rate: f64,
    pub gdp_growth: f64,
}

impl Default for EconomicIndicators {
    fn default() -> Self {
        Self {
            policy_rate: Indicator::PolicyRate.default_value(),
            prime_rate: Indicator::PrimeRate.default_value(),
            mortgage_rate_5y: Indicator::MortgageRate5y.default_value(),
            inflation_rate: Indicator::InflationRate.default_value(),
            unemployment_rate: Indicator::UnemploymentRate.default_value(),
            exchange_rate: Indicator::ExchangeRate.default_value(),
            gdp_growth: Indicator::GdpGrowth.default_value(),
        }
    }
}

impl EconomicIndicators {
    pub fn get(&self, indicator: Indicator) -> f64 {
        match indicator {
            Indicator::PolicyRate => self.policy_rate,
            Indicator::PrimeRate => self.prime_rate,
            Indicator::MortgageRate5y => self.mortgage_rate_5y,
            Indicator::InflationRate => self.inflation_rate,
            Indicator::UnemploymentRate => self.unemployment_rate,
            Indicator::ExchangeRate => self.exchange_rate,
            Indicator::GdpGrowth => self.gdp_growth,
        }
    }

    fn set(&mut self, indicator: Indicator, value: f64) {
        match indicator {
            Indicator::PolicyRate => self.policy_rate = value,
            Indicator::PrimeRate => self.prime_rate = value,
            Indicator::MortgageRate5y => self.mortgage_rate_5y = value,
            Indicator::InflationRate => self.inflation_rate = value,
            Indicator::UnemploymentRate => self.unemployment_rate = value,
            Indicator::ExchangeRate => self.exchange_rate = value,
            Indicator::GdpGrowth => self.gdp_growth = value,
        }
    }

    /// Build indicators from a provider's flat map. Absent or non-finite entries
    /// take their default and are returned in the second element.
    pub fn from_observations(observations: &HashMap<String, f64>) -> (Self, Vec<Indicator>) {
        let mut indicators = Self::default();
        let mut defaulted = Vec::new();
        for indicator in Indicator::ALL {
            match observations.get(indicator.key()) {
                Some(value) if value.is_finite() => indicators.set(indicator, *value),
                _ => defaulted.push(indicator),
            }
        }
        (indicators, defaulted)
    }
}

/// Composite indices derived from the raw indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeIndices {
    /// Step function of the policy rate, one of {0, 0.25, 0.5, 0.75, 1}.
    pub interest_rate_environment: f64,
    /// [-1, 1]
    pub economic_momentum: f64,
    /// [0, 1]
    pub affordability_pressure: f64,
}

impl CompositeIndices {
    pub fn derive(indicators: &EconomicIndicators) -> Self {
        Self {
            interest_rate_environment: interest_rate_environment(indicators.policy_rate),
            economic_momentum: economic_momentum(
                indicators.gdp_growth,
                indicators.unemployment_rate,
            ),
            affordability_pressure: affordability_pressure(
                indicators.mortgage_rate_5y,
                indicators.inflation_rate,
            ),
        }
    }
}

pub fn interest_rate_environment(policy_rate: f64) -> f64 {
    if policy_rate <= 1.0 {
        0.0
    } else if policy_rate <= 3.0 {
        0.25
    } else if policy_rate <= 5.0 {
        0.5
    } else if policy_rate <= 7.0 {
        0.75
    } else {
        1.0
    }
}

pub fn economic_momentum(gdp_growth: f64, unemployment_rate: f64) -> f64 {
    let gdp_score = if gdp_growth > 3.0 {
        1.0
    } else if gdp_growth > 1.0 {
        0.5
    } else if gdp_growth < 0.0 {
        -1.0
    } else {
        0.0
    };

    let unemployment_score = if unemployment_rate < 4.0 {
        1.0
    } else if unemployment_rate < 6.0 {
        0.5
    } else if unemployment_rate > 8.0 {
        -1.0
    } else {
        0.0
    };

    (gdp_score + unemployment_score) / 2.0
}

pub fn affordability_pressure(mortgage_rate: f64, inflation_rate: f64) -> f64 {
    0.7 * (mortgage_rate / 8.0).min(1.0) + 0.3 * ((inflation_rate - 2.0).max(0.0) / 5.0).min(1.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Fetched from a provider (possibly with some indicators defaulted).
    Live,
    /// Built-in defaults; no provider data was ever obtained.
    Defaults,
}

/// A timestamped, immutable set of indicators plus derived composites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicSnapshot {
    pub indicators: EconomicIndicators,
    pub composites: CompositeIndices,
    pub fetched_at: DateTime<Utc>,
    pub source: SnapshotSource,
    /// Indicators the provider did not supply, filled from defaults.
    #[serde(default)]
    pub defaulted: Vec<Indicator>,
}

impl EconomicSnapshot {
    pub fn from_indicators(
        indicators: EconomicIndicators,
        fetched_at: DateTime<Utc>,
        source: SnapshotSource,
        defaulted: Vec<Indicator>,
    ) -> Self {
        Self {
            composites: CompositeIndices::derive(&indicators),
            indicators,
            fetched_at,
            source,
            defaulted,
        }
    }

    pub fn defaults() -> Self {
        Self::defaults_at(Utc::now())
    }

    pub fn defaults_at(at: DateTime<Utc>) -> Self {
        Self::from_indicators(
            EconomicIndicators::default(),
            at,
            SnapshotSource::Defaults,
            Indicator::ALL.to_vec(),
        )
    }

    pub fn from_observations(observations: &HashMap<String, f64>, at: DateTime<Utc>) -> Self {
        let (indicators, defaulted) = EconomicIndicators::from_observations(observations);
        Self::from_indicators(indicators, at, SnapshotSource::Live, defaulted)
    }

    /// Flat name → value view including composites, as exposed to callers.
    pub fn as_map(&self) -> HashMap<String, f64> {
        let mut map: HashMap<String, f64> = Indicator::ALL
            .iter()
            .map(|i| (i.key().to_string(), self.indicators.get(*i)))
            .collect();
        map.insert(
            "interest_rate_environment".to_string(),
            self.composites.interest_rate_environment,
        );
        map.insert(
            "economic_momentum".to_string(),
            self.composites.economic_momentum,
        );
        map.insert(
            "affordability_pressure".to_string(),
            self.composites.affordability_pressure,
        );
        map
    }

    pub fn is_default(&self) -> bool {
        self.source == SnapshotSource::Defaults
    }
}
