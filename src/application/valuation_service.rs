use crate::application::analysis::{comparables, insights, scoring};
use crate::application::economic::indicator_cache::EconomicIndicatorCache;
use crate::application::ml::feature_assembler::{FeatureAssembler, FeatureOverrides};
use crate::application::ml::feature_importance::{
    FeatureImportanceReport, FeatureImportanceReporter,
};
use crate::application::ml::model_registry::ModelRegistry;
use crate::application::ml::prediction_engine::{DEFAULT_INTERVAL_PCT, PredictionEngine};
use crate::application::ml::statistical_estimator::PropertyHints;
use crate::application::ranking::deal_ranker::{DealRanker, RankingConfig, RankingRequest};
use crate::domain::economic::EconomicSnapshot;
use crate::domain::errors::ValuationError;
use crate::domain::property::PropertyRecord;
use crate::domain::ranking::RankingPage;
use crate::domain::valuation::{Degradation, InvestmentAnalysis, PredictionResult, summarize};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineSettings {
    /// Half-width of the confidence interval as a fraction of the price.
    pub interval_pct: f64,
    pub ranking: RankingConfig,
    /// Fixed "today" for feature assembly and scoring; the system date when absent.
    pub reference_date: Option<NaiveDate>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            interval_pct: DEFAULT_INTERVAL_PCT,
            ranking: RankingConfig::default(),
            reference_date: None,
        }
    }
}

/// Entry point wiring the cache, registry, prediction, scoring and ranking.
///
/// Every public method returns a best-effort value; only feature-name and
/// vector-length mismatches surface as errors.
#[derive(Debug)]
pub struct ValuationEngine {
    cache: Arc<EconomicIndicatorCache>,
    registry: Arc<ModelRegistry>,
    prediction: Arc<PredictionEngine>,
    assembler: FeatureAssembler,
    ranker: DealRanker,
    importance: FeatureImportanceReporter,
    reference_date: Option<NaiveDate>,
}

impl ValuationEngine {
    pub fn new(
        cache: Arc<EconomicIndicatorCache>,
        registry: Arc<ModelRegistry>,
        settings: EngineSettings,
    ) -> Self {
        let prediction = Arc::new(PredictionEngine::with_interval(
            registry.clone(),
            settings.interval_pct,
        ));
        Self {
            ranker: DealRanker::new(prediction.clone(), settings.ranking),
            importance: FeatureImportanceReporter::new(registry.clone()),
            cache,
            registry,
            prediction,
            assembler: FeatureAssembler::new(),
            reference_date: settings.reference_date,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn as_of(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| Utc::now().date_naive())
    }

    pub async fn predict_property(&self, property: &PropertyRecord) -> PredictionResult {
        let snapshot = self.cache.get_snapshot().await;
        self.predict_with_snapshot(property, &snapshot)
    }

    /// Prediction after replacing named raw features.
    pub async fn predict_with_overrides(
        &self,
        property: &PropertyRecord,
        overrides: &FeatureOverrides,
    ) -> Result<PredictionResult, ValuationError> {
        let snapshot = self.cache.get_snapshot().await;
        let features =
            self.assembler
                .assemble_with_overrides(property, &snapshot, self.as_of(), overrides)?;
        let result = self.prediction.predict(&features, &hints_for(property));
        Ok(with_economic_degradations(result, &snapshot))
    }

    /// Prediction from a caller-built vector in canonical order.
    pub fn predict_raw(&self, values: &[f64]) -> Result<PredictionResult, ValuationError> {
        self.prediction.predict_raw(values)
    }

    /// Full analysis of one property against recent market sales.
    pub async fn analyze(
        &self,
        property: &PropertyRecord,
        market_sales: &[PropertyRecord],
    ) -> InvestmentAnalysis {
        let snapshot = self.cache.get_snapshot().await;
        let as_of = self.as_of();
        let prediction = self.predict_with_snapshot(property, &snapshot);

        let analysis = InvestmentAnalysis {
            property_id: property.id,
            investment_score: scoring::investment_score(property, &snapshot, as_of),
            risk_level: scoring::risk_level(property, &snapshot, as_of),
            market_trend: scoring::market_trend(property, market_sales, as_of),
            comparables: comparables::find_comparables(property, market_sales, as_of),
            insights: insights::generate_insights(property, &snapshot, as_of),
            degradations: prediction.degradations.clone(),
            error: prediction.error.clone(),
            prediction,
        };
        debug!(
            "ValuationEngine: analysed {} -> {:.0} ({}), score {:.1}, risk {}",
            analysis.property_id,
            analysis.predicted_price(),
            analysis.prediction.method,
            analysis.investment_score,
            analysis.risk_level
        );
        analysis
    }

    pub async fn rank(
        &self,
        candidates: &[PropertyRecord],
        request: RankingRequest,
    ) -> RankingPage {
        let snapshot = self.cache.get_snapshot().await;
        self.ranker.rank(candidates, &snapshot, self.as_of(), request)
    }

    /// Listings at least 5% under their estimate.
    pub async fn top_deals(
        &self,
        candidates: &[PropertyRecord],
        offset: usize,
        limit: Option<usize>,
    ) -> RankingPage {
        let request = RankingRequest {
            offset,
            limit,
            ..RankingRequest::top_deals()
        };
        self.rank(candidates, request).await
    }

    /// Listings priced between their estimate and 50% under it.
    pub async fn top_properties(
        &self,
        candidates: &[PropertyRecord],
        offset: usize,
        limit: Option<usize>,
    ) -> RankingPage {
        let request = RankingRequest {
            offset,
            limit,
            ..RankingRequest::top_properties()
        };
        self.rank(candidates, request).await
    }

    pub fn feature_importance(&self) -> FeatureImportanceReport {
        self.importance.report()
    }

    fn predict_with_snapshot(
        &self,
        property: &PropertyRecord,
        snapshot: &EconomicSnapshot,
    ) -> PredictionResult {
        let features = self.assembler.assemble(property, snapshot, self.as_of());
        let result = self.prediction.predict(&features, &hints_for(property));
        with_economic_degradations(result, snapshot)
    }
}

fn hints_for(property: &PropertyRecord) -> PropertyHints {
    PropertyHints {
        city: property.city_name().map(str::to_string),
        lot_sqft: property.lot_sqft(),
    }
}

fn with_economic_degradations(
    mut result: PredictionResult,
    snapshot: &EconomicSnapshot,
) -> PredictionResult {
    let economic = if snapshot.is_default() {
        Some(Degradation::EconomicDefaultsUsed)
    } else if !snapshot.defaulted.is_empty() {
        Some(Degradation::EconomicIndicatorsDefaulted(
            snapshot.defaulted.iter().map(|i| i.key().to_string()).collect(),
        ))
    } else {
        None
    };

    if let Some(degradation) = economic {
        result.degradations.insert(0, degradation);
        result.error = summarize(&result.degradations);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::economic::indicator_cache::CacheSettings;
    use crate::domain::valuation::PredictionMethod;
    use crate::infrastructure::mock::{
        FailingIndicatorProvider, MockIndicatorProvider, MockModelLoader, MockValuationModel,
    };

    fn engine(loader: MockModelLoader, live: bool) -> ValuationEngine {
        let cache = if live {
            EconomicIndicatorCache::new(
                Arc::new(MockIndicatorProvider::with_policy_rate(2.75)),
                CacheSettings::default(),
            )
        } else {
            EconomicIndicatorCache::new(
                Arc::new(FailingIndicatorProvider),
                CacheSettings::default(),
            )
        };
        ValuationEngine::new(
            Arc::new(cache),
            Arc::new(ModelRegistry::new(Arc::new(loader))),
            EngineSettings {
                reference_date: NaiveDate::from_ymd_opt(2026, 10, 18),
                ..EngineSettings::default()
            },
        )
    }

    fn toronto_detached() -> PropertyRecord {
        PropertyRecord {
            id: 42,
            bedrooms: Some(3),
            bathrooms: Some(2.0),
            sqft: Some(1500.0),
            city: Some("Toronto".to_string()),
            property_type: Some("Detached".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_predict_reports_economic_defaults() {
        let engine = engine(MockModelLoader::new(), false);
        let result = engine.predict_property(&toronto_detached()).await;
        assert_eq!(result.method, PredictionMethod::Statistical);
        assert_eq!(
            result.degradations,
            vec![Degradation::EconomicDefaultsUsed, Degradation::NoModelLoaded]
        );
        assert!(result.error.unwrap().contains("defaults used"));
    }

    #[tokio::test]
    async fn test_live_snapshot_with_model_is_clean() {
        let loader =
            MockModelLoader::new().with_model("rf", MockValuationModel::constant(900_000.0));
        let engine = engine(loader, true);
        assert!(engine.registry().load("rf"));

        let result = engine.predict_property(&toronto_detached()).await;
        assert_eq!(result.method, PredictionMethod::Model);
        assert!(result.degradations.is_empty());
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_overrides_and_raw_errors() {
        let engine = engine(MockModelLoader::new(), true);
        let mut overrides = FeatureOverrides::new();
        overrides.insert("not_a_feature".to_string(), 1.0);
        let err = engine
            .predict_with_overrides(&toronto_detached(), &overrides)
            .await
            .unwrap_err();
        assert!(err.is_consistency_error());
        assert!(engine.predict_raw(&[0.0; 3]).is_err());
    }

    #[tokio::test]
    async fn test_analyze() {
        let engine = engine(MockModelLoader::new(), true);
        let analysis = engine.analyze(&toronto_detached(), &[]).await;
        assert_eq!(analysis.property_id, 42);
        assert!((0.0..=10.0).contains(&analysis.investment_score));
        assert!(analysis.comparables.is_empty());
        assert!(analysis.insights.len() <= 5);
        assert_eq!(analysis.degradations, analysis.prediction.degradations);
    }
}
