//! propvalue - property valuation and undervaluation ranking
//!
//! Thin command-line runner over the valuation engine. Results are printed
//! to stdout as JSON; logs go to stderr.
//!
//! # Usage
//! ```sh
//! MODEL_DIR=models cargo run -- deals --listings listings.json --limit 10
//! cargo run -- predict --property property.json
//! ```
//!
//! # Environment Variables
//! - `ECONOMIC_PROVIDER` - `static` (default) or `bank_of_canada`
//! - `MODEL_DIR` / `MODEL_NAME` - artifact directory and model to activate
//! - `RUST_LOG` - log filter (default: info)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use propvalue::application::economic::indicator_cache::EconomicIndicatorCache;
use propvalue::application::ml::model_registry::ModelRegistry;
use propvalue::application::valuation_service::ValuationEngine;
use propvalue::config::{Config, EconomicProviderKind};
use propvalue::domain::ports::EconomicIndicatorProvider;
use propvalue::domain::property::PropertyRecord;
use propvalue::infrastructure::{BankOfCanadaProvider, FileModelLoader, StaticIndicatorProvider};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Property valuation and deal ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank listings by undervaluation
    Deals {
        /// JSON array of property records
        #[arg(short, long)]
        listings: PathBuf,

        /// Use the wider 0-50% band instead of the >=5% deal threshold
        #[arg(long)]
        all: bool,

        #[arg(long, default_value = "0")]
        offset: usize,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Analyse one property, optionally against recent sales
    Predict {
        /// JSON property record
        #[arg(short, long)]
        property: PathBuf,

        /// JSON array of sold properties used for comparables and trend
        #[arg(long)]
        sales: Option<PathBuf>,
    },
    /// List available models with their recorded performance
    Models,
    /// Feature importance of the active model
    Importance,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stderr_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "propvalue {} starting: provider={:?}, model_dir={:?}",
        env!("CARGO_PKG_VERSION"),
        config.economic.provider,
        config.model.model_dir
    );

    let engine = build_engine(&config);

    match cli.command {
        Commands::Deals {
            listings,
            all,
            offset,
            limit,
        } => {
            let candidates: Vec<PropertyRecord> = read_json(&listings)?;
            info!("Ranking {} listings", candidates.len());
            let page = if all {
                engine.top_properties(&candidates, offset, limit).await
            } else {
                engine.top_deals(&candidates, offset, limit).await
            };
            print_json(&page)?;
        }
        Commands::Predict { property, sales } => {
            let property: PropertyRecord = read_json(&property)?;
            let sales: Vec<PropertyRecord> = match sales {
                Some(path) => read_json(&path)?,
                None => Vec::new(),
            };
            print_json(&engine.analyze(&property, &sales).await)?;
        }
        Commands::Models => {
            #[derive(Serialize)]
            struct ModelsReport {
                available: Vec<String>,
                active: Option<String>,
                comparison: Vec<propvalue::domain::ml::model_metadata::ModelComparison>,
                retrain_recommended: bool,
            }
            let registry = engine.registry();
            print_json(&ModelsReport {
                available: registry.list_available(),
                active: registry.active().map(|h| h.name.clone()),
                comparison: registry.compare(),
                retrain_recommended: registry.retrain_recommended(chrono::Utc::now()),
            })?;
        }
        Commands::Importance => print_json(&engine.feature_importance())?,
    }

    Ok(())
}

fn build_engine(config: &Config) -> ValuationEngine {
    let provider: Arc<dyn EconomicIndicatorProvider> = match config.economic.provider {
        EconomicProviderKind::Static => Arc::new(StaticIndicatorProvider::default()),
        EconomicProviderKind::BankOfCanada => Arc::new(BankOfCanadaProvider::new(
            config.economic.api_url.clone(),
            config.economic.fetch_timeout,
        )),
    };
    let cache = Arc::new(EconomicIndicatorCache::new(provider, config.cache_settings()));

    let registry = Arc::new(ModelRegistry::new(Arc::new(FileModelLoader::new(
        config.model.model_dir.clone(),
    ))));
    let loaded = match &config.model.model_name {
        Some(name) => registry.load(name),
        None => registry.load_best(),
    };
    if !loaded {
        warn!("No valuation model active; predictions use the statistical estimator");
    }

    ValuationEngine::new(cache, registry, config.engine_settings())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {:?}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
