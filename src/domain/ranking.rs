//! Undervaluation ranking types.

use crate::domain::property::PropertyRecord;
use crate::domain::valuation::{PredictionMethod, RiskLevel};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which listings a ranking keeps, by `value_diff_percent`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueBand {
    pub min_percent: f64,
    pub max_percent: Option<f64>,
}

impl ValueBand {
    /// General "top properties": fairly priced to 50% under.
    pub const TOP_PROPERTIES: ValueBand = ValueBand {
        min_percent: 0.0,
        max_percent: Some(50.0),
    };

    /// Stricter undervaluation threshold for "top deals".
    pub const TOP_DEALS: ValueBand = ValueBand {
        min_percent: 5.0,
        max_percent: None,
    };

    pub fn contains(&self, value_diff_percent: f64) -> bool {
        value_diff_percent >= self.min_percent
            && self.max_percent.is_none_or(|max| value_diff_percent <= max)
    }
}

/// How the predicted price for a ranked listing was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    ExistingValuation,
    Engine(PredictionMethod),
    SizeBased,
    ScoreBased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DealQuality {
    #[serde(rename = "Below Average")]
    BelowAverage,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
    Exceptional,
}

impl DealQuality {
    /// Buckets undervaluation (percent) together with the investment score.
    pub fn classify(value_diff_percent: f64, investment_score: f64) -> Self {
        if value_diff_percent >= 25.0 && investment_score >= 8.0 {
            Self::Exceptional
        } else if value_diff_percent >= 15.0 && investment_score >= 7.0 {
            Self::Excellent
        } else if value_diff_percent >= 10.0 && investment_score >= 6.0 {
            Self::VeryGood
        } else if value_diff_percent >= 5.0 {
            Self::Good
        } else {
            Self::BelowAverage
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::BelowAverage => "Below Average",
            Self::Good => "Good",
            Self::VeryGood => "Very Good",
            Self::Excellent => "Excellent",
            Self::Exceptional => "Exceptional",
        }
    }
}

impl fmt::Display for DealQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealAnalysis {
    pub predicted_price: f64,
    pub price_source: PriceSource,
    pub investment_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealMetrics {
    pub actual_price: f64,
    pub value_diff: f64,
    pub value_diff_percent: f64,
    pub price_ratio: f64,
    pub deal_quality: DealQuality,
}

/// One ranked `(property, analysis, metrics)` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDeal {
    pub property: PropertyRecord,
    pub analysis: DealAnalysis,
    pub metrics: DealMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingPage {
    pub items: Vec<RankedDeal>,
    /// Matches before pagination.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
    /// Candidates dropped as implausible or unpriceable.
    pub excluded: usize,
}
