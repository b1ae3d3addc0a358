//! Configuration module for propvalue.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by concern: Economic data, Model, and Ranking.

mod economic_config;
mod model_config;
mod ranking_config;

pub use economic_config::{EconomicEnvConfig, EconomicProviderKind};
pub use model_config::ModelEnvConfig;
pub use ranking_config::RankingEnvConfig;

use crate::application::economic::indicator_cache::CacheSettings;
use crate::application::ranking::deal_ranker::RankingConfig;
use crate::application::valuation_service::EngineSettings;
use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Read `key`, falling back to `default` when unset.
pub(crate) fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr + ToString,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .trim()
        .parse::<T>()
        .context(format!("Failed to parse {}", key))
}

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub economic: EconomicEnvConfig,
    pub model: ModelEnvConfig,
    pub ranking: RankingEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let economic = EconomicEnvConfig::from_env().context("Failed to load economic config")?;
        let model = ModelEnvConfig::from_env().context("Failed to load model config")?;
        let ranking = RankingEnvConfig::from_env().context("Failed to load ranking config")?;
        Ok(Self {
            economic,
            model,
            ranking,
        })
    }

    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            ttl: self.economic.cache_ttl,
            fetch_timeout: self.economic.fetch_timeout,
            retry_backoff: self.economic.retry_backoff,
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            interval_pct: self.model.confidence_interval_pct / 100.0,
            ranking: RankingConfig {
                max_price_ratio: self.ranking.max_price_ratio,
                predict_missing: self.ranking.predict_missing,
                default_limit: self.ranking.default_limit,
            },
            reference_date: None,
        }
    }
}
