//! Economic data configuration parsing from environment variables.

use super::parse_var;
use crate::infrastructure::economic::bank_of_canada::DEFAULT_VALET_URL;
use anyhow::Result;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EconomicProviderKind {
    /// Built-in indicator values, no network.
    Static,
    BankOfCanada,
}

impl FromStr for EconomicProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "bank_of_canada" | "boc" => Ok(Self::BankOfCanada),
            _ => anyhow::bail!(
                "Invalid ECONOMIC_PROVIDER: {}. Must be 'static' or 'bank_of_canada'",
                s
            ),
        }
    }
}

/// Economic indicator feed and cache configuration
#[derive(Debug, Clone)]
pub struct EconomicEnvConfig {
    pub provider: EconomicProviderKind,
    pub api_url: String,
    pub cache_ttl: Duration,
    pub fetch_timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for EconomicEnvConfig {
    fn default() -> Self {
        Self {
            provider: EconomicProviderKind::Static,
            api_url: DEFAULT_VALET_URL.to_string(),
            cache_ttl: Duration::from_secs(3600),
            fetch_timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_secs(300),
        }
    }
}

impl EconomicEnvConfig {
    pub fn from_env() -> Result<Self> {
        let provider = env::var("ECONOMIC_PROVIDER")
            .unwrap_or_else(|_| "static".to_string())
            .parse::<EconomicProviderKind>()?;

        Ok(Self {
            provider,
            api_url: env::var("ECONOMIC_API_URL").unwrap_or_else(|_| DEFAULT_VALET_URL.to_string()),
            cache_ttl: Duration::from_secs(parse_var("ECONOMIC_CACHE_TTL_SECS", 3600u64)?),
            fetch_timeout: Duration::from_secs(parse_var("ECONOMIC_FETCH_TIMEOUT_SECS", 10u64)?),
            retry_backoff: Duration::from_secs(parse_var("ECONOMIC_RETRY_BACKOFF_SECS", 300u64)?),
        })
    }
}
