use crate::config::{Config, EconomicProviderKind};
use std::env;
use std::sync::Mutex;
use std::sync::OnceLock;
use std::time::Duration;

// Global lock to prevent race conditions when modifying environment variables in tests
static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn get_env_lock() -> &'static Mutex<()> {
    ENV_LOCK.get_or_init(|| Mutex::new(()))
}

const VARS: [&str; 11] = [
    "ECONOMIC_PROVIDER",
    "ECONOMIC_API_URL",
    "ECONOMIC_CACHE_TTL_SECS",
    "ECONOMIC_FETCH_TIMEOUT_SECS",
    "ECONOMIC_RETRY_BACKOFF_SECS",
    "MODEL_DIR",
    "MODEL_NAME",
    "CONFIDENCE_INTERVAL_PCT",
    "RANKING_MAX_PRICE_RATIO",
    "RANKING_PREDICT_MISSING",
    "RANKING_DEFAULT_LIMIT",
];

fn clear_vars() {
    for key in VARS {
        // SAFETY: callers hold ENV_LOCK, so no other test thread touches the environment
        unsafe { env::remove_var(key) };
    }
}

fn set_var(key: &str, value: &str) {
    // SAFETY: callers hold ENV_LOCK
    unsafe { env::set_var(key, value) };
}

#[test]
fn test_config_defaults() {
    let _guard = get_env_lock().lock().unwrap_or_else(|p| p.into_inner());
    clear_vars();

    let config = Config::from_env().unwrap();
    assert_eq!(config.economic.provider, EconomicProviderKind::Static);
    assert_eq!(config.economic.cache_ttl, Duration::from_secs(3600));
    assert_eq!(config.economic.fetch_timeout, Duration::from_secs(10));
    assert_eq!(config.model.model_name, None);
    assert_eq!(config.model.confidence_interval_pct, 15.0);
    assert_eq!(config.ranking.max_price_ratio, 5.0);
    assert!(config.ranking.predict_missing);
    assert_eq!(config.ranking.default_limit, 20);
}

#[test]
fn test_config_overrides() {
    let _guard = get_env_lock().lock().unwrap_or_else(|p| p.into_inner());
    clear_vars();

    set_var("ECONOMIC_PROVIDER", "bank_of_canada");
    set_var("ECONOMIC_CACHE_TTL_SECS", "120");
    set_var("MODEL_DIR", "/srv/models");
    set_var("MODEL_NAME", "random_forest");
    set_var("CONFIDENCE_INTERVAL_PCT", "10");
    set_var("RANKING_PREDICT_MISSING", "false");
    set_var("RANKING_DEFAULT_LIMIT", "50");

    let config = Config::from_env().unwrap();
    assert_eq!(config.economic.provider, EconomicProviderKind::BankOfCanada);
    assert_eq!(config.cache_settings().ttl, Duration::from_secs(120));
    assert_eq!(config.model.model_dir.to_str(), Some("/srv/models"));
    assert_eq!(config.model.model_name.as_deref(), Some("random_forest"));

    let settings = config.engine_settings();
    assert!((settings.interval_pct - 0.10).abs() < 1e-12);
    assert!(!settings.ranking.predict_missing);
    assert_eq!(settings.ranking.default_limit, 50);

    clear_vars();
}

#[test]
fn test_config_rejects_invalid_values() {
    let _guard = get_env_lock().lock().unwrap_or_else(|p| p.into_inner());
    clear_vars();

    set_var("ECONOMIC_FETCH_TIMEOUT_SECS", "soon");
    assert!(Config::from_env().is_err());
    clear_vars();

    set_var("ECONOMIC_PROVIDER", "fred");
    assert!(Config::from_env().is_err());
    clear_vars();

    set_var("CONFIDENCE_INTERVAL_PCT", "150");
    assert!(Config::from_env().is_err());
    clear_vars();

    set_var("RANKING_MAX_PRICE_RATIO", "0.5");
    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("RANKING_MAX_PRICE_RATIO"));
    clear_vars();

    for ratio in ["NaN", "inf"] {
        set_var("RANKING_MAX_PRICE_RATIO", ratio);
        let err = Config::from_env().unwrap_err();
        assert!(format!("{:#}", err).contains("RANKING_MAX_PRICE_RATIO"));
        clear_vars();
    }

    set_var("RANKING_PREDICT_MISSING", "no");
    let err = Config::from_env().unwrap_err();
    assert!(format!("{:#}", err).contains("RANKING_PREDICT_MISSING"));
    clear_vars();
}
