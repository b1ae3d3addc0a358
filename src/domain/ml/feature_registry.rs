use crate::domain::errors::ValuationError;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const FEATURE_COUNT: usize = 26;

/// Ordered list of feature names.
/// This order MUST match the column order the valuation models were trained with.
/// Any change here is a breaking change for ML models.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "bedrooms",
    "bathrooms",
    "sqft",
    "lot_size",
    "rooms",
    "city_code",
    "province_code",
    "property_type_code",
    "year_built",
    "current_year",
    "current_month",
    "days_on_market",
    "annual_taxes",
    "policy_rate",
    "prime_rate",
    "mortgage_rate_5y",
    "inflation_rate",
    "unemployment_rate",
    "exchange_rate",
    "gdp_growth",
    "interest_rate_environment",
    "economic_momentum",
    "affordability_pressure",
    "property_affordability",
    "property_economic_sensitivity",
    "market_timing",
];

/// Slot positions, named for readability at call sites.
pub mod slot {
    pub const BEDROOMS: usize = 0;
    pub const BATHROOMS: usize = 1;
    pub const SQFT: usize = 2;
    pub const LOT_SIZE: usize = 3;
    pub const ROOMS: usize = 4;
    pub const CITY_CODE: usize = 5;
    pub const PROVINCE_CODE: usize = 6;
    pub const PROPERTY_TYPE_CODE: usize = 7;
    pub const YEAR_BUILT: usize = 8;
    pub const CURRENT_YEAR: usize = 9;
    pub const CURRENT_MONTH: usize = 10;
    pub const DAYS_ON_MARKET: usize = 11;
    pub const ANNUAL_TAXES: usize = 12;
    pub const POLICY_RATE: usize = 13;
    pub const PRIME_RATE: usize = 14;
    pub const MORTGAGE_RATE_5Y: usize = 15;
    pub const INFLATION_RATE: usize = 16;
    pub const UNEMPLOYMENT_RATE: usize = 17;
    pub const EXCHANGE_RATE: usize = 18;
    pub const GDP_GROWTH: usize = 19;
    pub const INTEREST_RATE_ENVIRONMENT: usize = 20;
    pub const ECONOMIC_MOMENTUM: usize = 21;
    pub const AFFORDABILITY_PRESSURE: usize = 22;
    pub const PROPERTY_AFFORDABILITY: usize = 23;
    pub const PROPERTY_ECONOMIC_SENSITIVITY: usize = 24;
    pub const MARKET_TIMING: usize = 25;
}

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// Fixed-width model input. The length is enforced by the type; conversions
/// from slices of any other length fail.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn get(&self, index: usize) -> f64 {
        self.0[index]
    }

    pub fn set(&mut self, index: usize, value: f64) {
        self.0[index] = value;
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Set a slot by canonical name.
    pub fn set_named(&mut self, name: &str, value: f64) -> Result<(), ValuationError> {
        let index = feature_index(name).ok_or_else(|| ValuationError::UnknownFeature {
            name: name.to_string(),
        })?;
        self.0[index] = value;
        Ok(())
    }

    /// Values reordered to a model's declared column order.
    pub fn reordered(&self, order: &[usize]) -> Vec<f64> {
        order.iter().map(|i| self.0[*i]).collect()
    }

    pub fn iter_named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = ValuationError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let array: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| ValuationError::FeatureLengthMismatch {
                    expected: FEATURE_COUNT,
                    actual: values.len(),
                })?;
        Ok(Self(array))
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = ValuationError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::try_from(values.as_slice())
    }
}

impl From<FeatureVector> for Vec<f64> {
    fn from(vector: FeatureVector) -> Self {
        vector.0.to_vec()
    }
}

/// Semantic grouping used by importance reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureCategory {
    #[serde(rename = "Property Physical")]
    PropertyPhysical,
    #[serde(rename = "Location & Type")]
    LocationAndType,
    #[serde(rename = "Age & Timing")]
    AgeAndTiming,
    Financial,
    #[serde(rename = "Economic Indicators")]
    EconomicIndicators,
    #[serde(rename = "Derived Economic")]
    DerivedEconomic,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 6] = [
        FeatureCategory::PropertyPhysical,
        FeatureCategory::LocationAndType,
        FeatureCategory::AgeAndTiming,
        FeatureCategory::Financial,
        FeatureCategory::EconomicIndicators,
        FeatureCategory::DerivedEconomic,
    ];

    pub fn of_index(index: usize) -> Self {
        match index {
            0..=4 => Self::PropertyPhysical,
            5..=7 => Self::LocationAndType,
            8..=11 => Self::AgeAndTiming,
            12 => Self::Financial,
            13..=19 => Self::EconomicIndicators,
            _ => Self::DerivedEconomic,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PropertyPhysical => "Property Physical",
            Self::LocationAndType => "Location & Type",
            Self::AgeAndTiming => "Age & Timing",
            Self::Financial => "Financial",
            Self::EconomicIndicators => "Economic Indicators",
            Self::DerivedEconomic => "Derived Economic",
        }
    }
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
