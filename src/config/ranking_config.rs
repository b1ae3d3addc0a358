//! Ranking configuration parsing from environment variables.

use super::parse_var;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct RankingEnvConfig {
    pub max_price_ratio: f64,
    pub predict_missing: bool,
    pub default_limit: usize,
}

impl Default for RankingEnvConfig {
    fn default() -> Self {
        Self {
            max_price_ratio: 5.0,
            predict_missing: true,
            default_limit: 20,
        }
    }
}

impl RankingEnvConfig {
    pub fn from_env() -> Result<Self> {
        let max_price_ratio = parse_var("RANKING_MAX_PRICE_RATIO", 5.0f64)?;
        if !max_price_ratio.is_finite() || max_price_ratio <= 1.0 {
            anyhow::bail!(
                "RANKING_MAX_PRICE_RATIO must be a finite number greater than 1, got {}",
                max_price_ratio
            );
        }

        Ok(Self {
            max_price_ratio,
            predict_missing: parse_var("RANKING_PREDICT_MISSING", true)?,
            default_limit: parse_var("RANKING_DEFAULT_LIMIT", 20usize)?,
        })
    }
}
