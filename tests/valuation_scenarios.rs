use propvalue::application::economic::indicator_cache::{CacheSettings, EconomicIndicatorCache};
use propvalue::application::ml::feature_assembler::FeatureAssembler;
use propvalue::application::ml::model_registry::ModelRegistry;
use propvalue::application::ranking::deal_ranker::RankingRequest;
use propvalue::application::valuation_service::{EngineSettings, ValuationEngine};
use propvalue::domain::economic::{EconomicSnapshot, interest_rate_environment};
use propvalue::domain::ml::feature_registry::{FEATURE_COUNT, FEATURE_NAMES};
use propvalue::domain::property::PropertyRecord;
use propvalue::domain::valuation::{MAX_PRICE, MIN_PRICE, PredictionMethod, RiskLevel};
use propvalue::infrastructure::mock::{
    FailingIndicatorProvider, MockIndicatorProvider, MockModelLoader, MockValuationModel,
};

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
}

fn engine_with(loader: MockModelLoader) -> ValuationEngine {
    let cache = EconomicIndicatorCache::new(
        Arc::new(FailingIndicatorProvider),
        CacheSettings::default(),
    );
    ValuationEngine::new(
        Arc::new(cache),
        Arc::new(ModelRegistry::new(Arc::new(loader))),
        EngineSettings {
            reference_date: Some(as_of()),
            ..EngineSettings::default()
        },
    )
}

fn listing(id: i64, listed: f64, valuation: f64) -> PropertyRecord {
    PropertyRecord {
        id,
        listed_price: Some(listed),
        ai_valuation: Some(valuation),
        investment_score: Some(6.5),
        ..Default::default()
    }
}

/// Scenario A: no model, Toronto detached house priced by the statistical path
#[tokio::test]
async fn test_statistical_estimate_for_toronto_detached() {
    let engine = engine_with(MockModelLoader::new());
    let property = PropertyRecord {
        bedrooms: Some(3),
        bathrooms: Some(2.0),
        sqft: Some(1500.0),
        city: Some("Toronto".to_string()),
        property_type: Some("Detached".to_string()),
        ..Default::default()
    };

    let result = engine.predict_property(&property).await;

    assert_eq!(result.method, PredictionMethod::Statistical);
    assert_eq!(result.method.to_string(), "statistical");
    assert!(
        (400_000.0..=1_200_000.0).contains(&result.predicted_price),
        "got {}",
        result.predicted_price
    );
    assert!(result.confidence_interval.contains(result.predicted_price));
    assert_eq!(result.feature_count, FEATURE_COUNT);
}

/// Scenario B: provider fails after the TTL expires, previous snapshot is kept
#[tokio::test]
async fn test_stale_snapshot_survives_provider_failure() {
    let provider = Arc::new(MockIndicatorProvider::with_policy_rate(2.25));
    let cache = EconomicIndicatorCache::new(
        provider.clone(),
        CacheSettings {
            ttl: Duration::from_millis(20),
            fetch_timeout: Duration::from_millis(200),
            retry_backoff: Duration::ZERO,
        },
    );

    let before = cache.get_snapshot().await;
    tokio::time::sleep(Duration::from_millis(40)).await;
    provider.fail_next(true);
    let after = cache.get_snapshot().await;

    assert_eq!(provider.calls(), 2);
    assert_eq!(*before, *after);
    assert_eq!(after.indicators.policy_rate, 2.25);
}

/// Scenario C: 400k listing valued at 600k is 33.3% under, in both bands
#[tokio::test]
async fn test_undervalued_listing_in_both_bands() {
    let engine = engine_with(MockModelLoader::new());
    let candidates = vec![listing(7, 400_000.0, 600_000.0)];

    for page in [
        engine.top_properties(&candidates, 0, None).await,
        engine.top_deals(&candidates, 0, None).await,
    ] {
        assert_eq!(page.total, 1);
        assert!((page.items[0].metrics.value_diff_percent - 33.3).abs() <= 0.1);
    }
}

/// Scenario D: predicted/actual ratio of 7.5 is excluded entirely
#[tokio::test]
async fn test_implausible_ratio_is_excluded() {
    let engine = engine_with(MockModelLoader::new());
    let candidates = vec![listing(8, 400_000.0, 3_000_000.0)];

    let page = engine.rank(&candidates, RankingRequest::top_deals()).await;
    assert!(page.items.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.excluded, 1);
}

/// Scenario E: loading a missing artifact keeps the active model
#[tokio::test]
async fn test_missing_artifact_leaves_active_model() {
    let loader =
        MockModelLoader::new().with_model("forest", MockValuationModel::constant(640_000.0));
    let engine = engine_with(loader);
    let registry = engine.registry();

    assert!(registry.load("forest"));
    assert!(!registry.load("missing_model"));
    assert_eq!(registry.active().unwrap().name, "forest");

    let result = engine.predict_property(&PropertyRecord::default()).await;
    assert_eq!(result.method, PredictionMethod::Model);
    assert_eq!(result.predicted_price, 640_000.0);
}

#[tokio::test]
async fn test_sparse_records_still_produce_bounded_estimates() {
    let engine = engine_with(MockModelLoader::new());
    let records = vec![
        PropertyRecord::default(),
        PropertyRecord {
            sqft: Some(90_000.0),
            city: Some("West Vancouver".to_string()),
            ..Default::default()
        },
        PropertyRecord {
            sqft: Some(120.0),
            bedrooms: Some(0),
            bathrooms: Some(0.0),
            property_type: Some("apartment".to_string()),
            ..Default::default()
        },
        serde_json::from_str(r#"{"id": 9, "sqft": "abc", "bedrooms": "three", "year_built": null}"#)
            .unwrap(),
    ];

    for record in &records {
        let result = engine.predict_property(record).await;
        assert!((MIN_PRICE..=MAX_PRICE).contains(&result.predicted_price));
        assert!(result.confidence_interval.contains(result.predicted_price));
        assert!(result.error.is_some());
    }
}

#[test]
fn test_feature_vector_is_always_canonical() {
    let snapshot = EconomicSnapshot::defaults();
    let assembler = FeatureAssembler::new();
    let sparse = PropertyRecord::default();
    let full = PropertyRecord {
        bedrooms: Some(2),
        bathrooms: Some(1.0),
        sqft: Some(900.0),
        lot_size: Some(0.1),
        rooms: Some(4),
        city: Some("Montreal".to_string()),
        province: Some("QC".to_string()),
        property_type: Some("Condo".to_string()),
        year_built: Some(1988),
        days_on_market: Some(22),
        annual_taxes: Some(3100.0),
        ..Default::default()
    };

    for record in [&sparse, &full] {
        let vector = assembler.assemble(record, &snapshot, as_of());
        let names: Vec<&str> = vector.iter_named().map(|(name, _)| name).collect();
        assert_eq!(names, FEATURE_NAMES.to_vec());
        assert!(vector.as_slice().iter().all(|v| v.is_finite()));
    }
}

#[test]
fn test_rate_environment_is_monotonic_and_discrete() {
    let mut previous = f64::MIN;
    for step in 0..=120 {
        let rate = step as f64 * 0.1;
        let env = interest_rate_environment(rate);
        assert!([0.0, 0.25, 0.5, 0.75, 1.0].contains(&env));
        assert!(env >= previous);
        previous = env;
    }
}

#[tokio::test]
async fn test_analysis_labels_are_bounded() {
    let engine = engine_with(MockModelLoader::new());
    for (city, kind, year, dom) in [
        ("Toronto", "Detached", 2024, 3),
        ("Fort McMurray", "Condo", 1950, 150),
        ("Halifax", "Townhouse", 1999, 45),
    ] {
        let property = PropertyRecord {
            city: Some(city.to_string()),
            property_type: Some(kind.to_string()),
            year_built: Some(year),
            days_on_market: Some(dom),
            ..Default::default()
        };
        let analysis = engine.analyze(&property, &[]).await;
        assert!((0.0..=10.0).contains(&analysis.investment_score));
        assert!(
            [
                RiskLevel::VeryLow,
                RiskLevel::Low,
                RiskLevel::Medium,
                RiskLevel::High,
                RiskLevel::VeryHigh
            ]
            .contains(&analysis.risk_level)
        );
        assert!(analysis.insights.len() <= 5);
    }
}
