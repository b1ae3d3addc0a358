//! Model registry and prediction configuration parsing from environment variables.

use super::parse_var;
use anyhow::Result;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ModelEnvConfig {
    pub model_dir: PathBuf,
    /// Model to activate at startup; the metadata's best model when unset.
    pub model_name: Option<String>,
    /// Confidence interval half-width, in percent of the predicted price.
    pub confidence_interval_pct: f64,
}

impl Default for ModelEnvConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            model_name: None,
            confidence_interval_pct: 15.0,
        }
    }
}

impl ModelEnvConfig {
    pub fn from_env() -> Result<Self> {
        let confidence_interval_pct = parse_var("CONFIDENCE_INTERVAL_PCT", 15.0f64)?;
        if !(0.0..=100.0).contains(&confidence_interval_pct) {
            anyhow::bail!(
                "CONFIDENCE_INTERVAL_PCT must be between 0 and 100, got {}",
                confidence_interval_pct
            );
        }

        Ok(Self {
            model_dir: PathBuf::from(
                env::var("MODEL_DIR").unwrap_or_else(|_| "models".to_string()),
            ),
            model_name: env::var("MODEL_NAME")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            confidence_interval_pct,
        })
    }
}
