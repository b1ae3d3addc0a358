use propvalue::application::economic::indicator_cache::{CacheSettings, EconomicIndicatorCache};
use propvalue::application::ml::feature_assembler::FeatureAssembler;
use propvalue::application::ml::feature_importance::ImportanceStatus;
use propvalue::application::ml::model_artifact::{ForestModel, ModelArtifact};
use propvalue::application::ml::model_registry::ModelRegistry;
use propvalue::application::valuation_service::{EngineSettings, ValuationEngine};
use propvalue::domain::economic::EconomicSnapshot;
use propvalue::domain::ml::feature_registry::FEATURE_NAMES;
use propvalue::domain::property::PropertyRecord;
use propvalue::domain::valuation::PredictionMethod;
use propvalue::infrastructure::ml::file_model_loader::ArtifactFile;
use propvalue::infrastructure::mock::{MockModelLoader, MockValuationModel};
use propvalue::infrastructure::{FileModelLoader, StaticIndicatorProvider};

use chrono::NaiveDate;
use serde_json::json;
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

/// Linear artifact whose only non-zero weight is on `sqft`, declared in reverse column order.
fn write_reversed_linear(dir: &Path, name: &str, intercept: f64, per_sqft: f64) {
    let names: Vec<&str> = FEATURE_NAMES.iter().rev().copied().collect();
    let coefficients: Vec<f64> = names
        .iter()
        .map(|n| if *n == "sqft" { per_sqft } else { 0.0 })
        .collect();
    let body = json!({
        "feature_names": names,
        "model": {"kind": "linear", "intercept": intercept, "coefficients": coefficients}
    });
    fs::write(dir.join(format!("{}.json", name)), body.to_string()).unwrap();
}

fn engine_over(dir: &Path) -> ValuationEngine {
    let cache = EconomicIndicatorCache::new(
        Arc::new(StaticIndicatorProvider::default()),
        CacheSettings::default(),
    );
    ValuationEngine::new(
        Arc::new(cache),
        Arc::new(ModelRegistry::new(Arc::new(FileModelLoader::new(dir)))),
        EngineSettings {
            reference_date: Some(as_of()),
            ..EngineSettings::default()
        },
    )
}

/// Test: artifacts declaring a permuted column order receive correctly mapped values
#[tokio::test]
async fn test_file_artifact_with_permuted_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_reversed_linear(dir.path(), "linear", 100_000.0, 400.0);
    let engine = engine_over(dir.path());

    assert!(engine.registry().load("linear"));
    let property = PropertyRecord {
        sqft: Some(1500.0),
        ..Default::default()
    };
    let result = engine.predict_property(&property).await;

    assert_eq!(result.method, PredictionMethod::Model);
    assert_eq!(result.model_name.as_deref(), Some("linear"));
    assert!((result.predicted_price - 700_000.0).abs() < 1e-6);
    assert!(result.error.is_none());
}

/// Forest trained on synthetic rows where price = 100k + 300 * sqft.
fn write_forest(dir: &Path, name: &str, feature_importances: Option<Vec<f64>>) {
    let rows: Vec<Vec<f64>> = (0..40)
        .map(|i| {
            let mut row = vec![0.0; FEATURE_NAMES.len()];
            row[0] = (i % 5 + 1) as f64;
            row[2] = 800.0 + 50.0 * i as f64;
            row
        })
        .collect();
    let targets: Vec<f64> = rows.iter().map(|r| 100_000.0 + 300.0 * r[2]).collect();

    let x = DenseMatrix::from_2d_vec(&rows).unwrap();
    let params = RandomForestRegressorParameters::default()
        .with_n_trees(5)
        .with_max_depth(6);
    let forest = RandomForestRegressor::fit(&x, &targets, params).unwrap();

    let artifact = ArtifactFile {
        feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
        model: ModelArtifact::RandomForest(ForestModel {
            model: forest,
            feature_importances,
        }),
    };
    fs::write(
        dir.join(format!("{}.json", name)),
        serde_json::to_string(&artifact).unwrap(),
    )
    .unwrap();
}

/// Test: a smartcore forest artifact round-trips through disk and serves predictions
#[tokio::test]
async fn test_file_forest_artifact() {
    let dir = tempfile::tempdir().unwrap();
    write_forest(dir.path(), "forest", None);
    let mut importances = vec![0.004; FEATURE_NAMES.len()];
    importances[2] = 0.9;
    write_forest(dir.path(), "forest_explained", Some(importances));

    let engine = engine_over(dir.path());
    assert!(engine.registry().load("forest"));
    assert_eq!(engine.registry().active().unwrap().model_type(), "random_forest");

    let property = PropertyRecord {
        sqft: Some(1500.0),
        ..Default::default()
    };
    let result = engine.predict_property(&property).await;
    assert_eq!(result.method, PredictionMethod::Model);
    assert_eq!(result.model_name.as_deref(), Some("forest"));
    assert!(
        (340_000.0..=925_000.0).contains(&result.predicted_price),
        "got {}",
        result.predicted_price
    );

    let report = engine.feature_importance();
    assert_eq!(
        report.status,
        ImportanceStatus::Unsupported {
            model_type: "random_forest".to_string()
        }
    );

    assert!(engine.registry().load("forest_explained"));
    let report = engine.feature_importance();
    assert!(report.is_available());
    assert_eq!(report.top(1)[0].name, "sqft");
    let total: f64 = report.features.iter().map(|f| f.importance).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

/// Test: weighted ensemble members are averaged by weight
#[tokio::test]
async fn test_file_ensemble_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let zeros = vec![0.0; FEATURE_NAMES.len()];
    let body = json!({
        "feature_names": FEATURE_NAMES,
        "model": {
            "kind": "ensemble",
            "weights": [3.0, 1.0],
            "members": [
                {"kind": "linear", "intercept": 500000.0, "coefficients": zeros},
                {"kind": "linear", "intercept": 700000.0, "coefficients": zeros}
            ]
        }
    });
    fs::write(dir.path().join("ensemble.json"), body.to_string()).unwrap();
    fs::write(
        dir.path().join("model_metadata.json"),
        json!({
            "training_date": "2026-10-10T00:00:00Z",
            "best_model": "ensemble",
            "performance": {"ensemble": {"r2": 0.82, "rmse": 120000.0, "mape": 11.0}}
        })
        .to_string(),
    )
    .unwrap();

    let engine = engine_over(dir.path());
    assert!(engine.registry().load_best());

    let result = engine.predict_property(&PropertyRecord::default()).await;
    assert!((result.predicted_price - 550_000.0).abs() < 1e-6);

    let comparison = engine.registry().compare();
    assert_eq!(comparison.len(), 1);
    assert!(comparison[0].is_best && comparison[0].is_active);

    let trained = chrono::DateTime::parse_from_rfc3339("2026-10-18T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    assert!(!engine.registry().retrain_recommended(trained));
}

/// Test: a broken artifact on disk never replaces a working model
#[tokio::test]
async fn test_broken_file_artifact_keeps_previous_model() {
    let dir = tempfile::tempdir().unwrap();
    write_reversed_linear(dir.path(), "good", 100_000.0, 400.0);
    fs::write(dir.path().join("truncated.json"), r#"{"feature_names": ["bedrooms"]"#).unwrap();
    write_reversed_linear(dir.path(), "negative", -5_000_000.0, 0.0);

    let engine = engine_over(dir.path());
    let registry = engine.registry();
    assert!(registry.load("good"));
    assert!(!registry.load("truncated"));
    assert!(!registry.load("negative"));
    assert_eq!(registry.active().unwrap().name, "good");
    assert_eq!(
        registry.list_available(),
        vec!["good".to_string(), "negative".to_string(), "truncated".to_string()]
    );
}

/// Test: readers always observe a complete model while loads succeed and fail concurrently
#[test]
fn test_concurrent_hot_swap() {
    let loader = MockModelLoader::new()
        .with_model("low", MockValuationModel::constant(500_000.0))
        .with_model("high", MockValuationModel::constant(900_000.0));
    let registry = Arc::new(ModelRegistry::new(Arc::new(loader)));
    assert!(registry.load("low"));

    let canary = FeatureAssembler::canary(&EconomicSnapshot::defaults(), as_of());
    let stop = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                let mut observed = 0usize;
                loop {
                    let handle = registry.active().expect("a model stays active");
                    let price = handle.predict(&canary).unwrap();
                    let expected = if handle.name == "low" { 500_000.0 } else { 900_000.0 };
                    assert_eq!(price, expected);
                    observed += 1;
                    if stop.load(Ordering::Relaxed) {
                        return observed;
                    }
                }
            })
        })
        .collect();

    let writer = {
        let registry = Arc::clone(&registry);
        thread::spawn(move || {
            for i in 0..200 {
                match i % 3 {
                    0 => assert!(registry.load("high")),
                    1 => assert!(!registry.load("absent")),
                    _ => assert!(registry.load("low")),
                }
            }
        })
    };

    writer.join().unwrap();
    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(registry.active().unwrap().name, "high");
}
