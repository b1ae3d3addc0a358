//! Value objects produced by the valuation pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_PRICE: f64 = 50_000.0;
pub const MAX_PRICE: f64 = 20_000_000.0;

pub fn clamp_price(price: f64) -> f64 {
    price.clamp(MIN_PRICE, MAX_PRICE)
}

pub fn is_price_in_bounds(price: f64) -> bool {
    (MIN_PRICE..=MAX_PRICE).contains(&price)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    Model,
    Statistical,
}

impl fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model => write!(f, "model"),
            Self::Statistical => write!(f, "statistical"),
        }
    }
}

/// Why a result is less than ideal. Attached to results instead of being raised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Degradation {
    NoModelLoaded,
    InferenceFailed(String),
    EconomicDefaultsUsed,
    EconomicIndicatorsDefaulted(Vec<String>),
    PriceClamped { raw: f64 },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModelLoaded => write!(f, "no valuation model loaded"),
            Self::InferenceFailed(reason) => write!(f, "model inference failed: {}", reason),
            Self::EconomicDefaultsUsed => write!(f, "economic data unavailable, defaults used"),
            Self::EconomicIndicatorsDefaulted(names) => {
                write!(f, "economic indicators defaulted: {}", names.join(", "))
            }
            Self::PriceClamped { raw } => write!(f, "raw estimate {:.0} clamped to bounds", raw),
        }
    }
}

/// Joins degradations into the optional error string exposed to callers.
pub fn summarize(degradations: &[Degradation]) -> Option<String> {
    if degradations.is_empty() {
        None
    } else {
        Some(
            degradations
                .iter()
                .map(|d| d.to_string())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn around(price: f64, pct: f64) -> Self {
        Self {
            lower: price * (1.0 - pct),
            upper: price * (1.0 + pct),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.lower <= value && value <= self.upper
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_price: f64,
    pub confidence: f64,
    pub confidence_interval: ConfidenceInterval,
    pub method: PredictionMethod,
    pub feature_count: usize,
    pub model_name: Option<String>,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Very Low")]
    VeryLow,
    Low,
    Medium,
    High,
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl RiskLevel {
    pub fn from_counter(counter: i32) -> Self {
        match counter {
            c if c <= -2 => Self::VeryLow,
            c if c <= 0 => Self::Low,
            c if c <= 2 => Self::Medium,
            c if c <= 4 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::VeryLow => "Very Low",
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketTrend {
    Rising,
    Stable,
    Declining,
    #[serde(rename = "Insufficient Data")]
    InsufficientData,
}

impl fmt::Display for MarketTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rising => write!(f, "Rising"),
            Self::Stable => write!(f, "Stable"),
            Self::Declining => write!(f, "Declining"),
            Self::InsufficientData => write!(f, "Insufficient Data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparableProperty {
    pub id: i64,
    pub address: Option<String>,
    pub city: Option<String>,
    pub sold_price: f64,
    pub sold_date: NaiveDate,
    pub sqft: Option<f64>,
    pub bedrooms: Option<u32>,
    pub price_per_sqft: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentAnalysis {
    pub property_id: i64,
    pub prediction: PredictionResult,
    pub investment_score: f64,
    pub risk_level: RiskLevel,
    pub market_trend: MarketTrend,
    pub comparables: Vec<ComparableProperty>,
    pub insights: Vec<String>,
    #[serde(default)]
    pub degradations: Vec<Degradation>,
    pub error: Option<String>,
}

impl InvestmentAnalysis {
    pub fn predicted_price(&self) -> f64 {
        self.prediction.predicted_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_mapping() {
        assert_eq!(RiskLevel::from_counter(-5), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_counter(-2), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_counter(-1), RiskLevel::Low);
        assert_eq!(RiskLevel::from_counter(0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_counter(2), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_counter(4), RiskLevel::High);
        assert_eq!(RiskLevel::from_counter(5), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_risk_level_serializes_to_label() {
        let json = serde_json::to_string(&RiskLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"Very High\"");
        let json = serde_json::to_string(&MarketTrend::InsufficientData).unwrap();
        assert_eq!(json, "\"Insufficient Data\"");
    }

    #[test]
    fn test_interval_brackets_price() {
        let interval = ConfidenceInterval::around(600_000.0, 0.15);
        assert!((interval.lower - 510_000.0).abs() < 1e-6);
        assert!((interval.upper - 690_000.0).abs() < 1e-6);
        assert!(interval.contains(600_000.0));
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize(&[]), None);
        let text = summarize(&[Degradation::NoModelLoaded, Degradation::EconomicDefaultsUsed]);
        assert_eq!(
            text.as_deref(),
            Some("no valuation model loaded; economic data unavailable, defaults used")
        );
    }
}
