//! Undervaluation ranking ("top deals").
//!
//! Each candidate is priced and scored independently on the rayon pool; only
//! the final sort and pagination run on the calling thread.

use crate::application::analysis::scoring;
use crate::application::ml::feature_assembler::FeatureAssembler;
use crate::application::ml::prediction_engine::PredictionEngine;
use crate::application::ml::statistical_estimator::{
    PropertyHints, price_per_sqft, type_multiplier, DEFAULT_PRICE_PER_SQFT,
};
use crate::domain::economic::EconomicSnapshot;
use crate::domain::property::PropertyRecord;
use crate::domain::ranking::{
    DealAnalysis, DealMetrics, DealQuality, PriceSource, RankedDeal, RankingPage, ValueBand,
};
use crate::domain::valuation::is_price_in_bounds;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingConfig {
    /// Candidates whose predicted/actual ratio exceeds this are implausible.
    pub max_price_ratio: f64,
    /// Run the prediction engine for candidates without a stored valuation.
    pub predict_missing: bool,
    pub default_limit: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            max_price_ratio: 5.0,
            predict_missing: true,
            default_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankingRequest {
    pub band: ValueBand,
    pub offset: usize,
    /// Page size; the configured default when absent.
    pub limit: Option<usize>,
}

impl RankingRequest {
    pub fn top_deals() -> Self {
        Self {
            band: ValueBand::TOP_DEALS,
            offset: 0,
            limit: None,
        }
    }

    pub fn top_properties() -> Self {
        Self {
            band: ValueBand::TOP_PROPERTIES,
            offset: 0,
            limit: None,
        }
    }

    pub fn page(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }
}

enum Outcome {
    Ranked(Box<RankedDeal>),
    OutOfBand,
    Excluded,
}

#[derive(Debug, Clone)]
pub struct DealRanker {
    engine: Arc<PredictionEngine>,
    assembler: FeatureAssembler,
    config: RankingConfig,
}

impl DealRanker {
    pub fn new(engine: Arc<PredictionEngine>, config: RankingConfig) -> Self {
        Self {
            engine,
            assembler: FeatureAssembler::new(),
            config,
        }
    }

    pub fn rank(
        &self,
        candidates: &[PropertyRecord],
        snapshot: &EconomicSnapshot,
        as_of: NaiveDate,
        request: RankingRequest,
    ) -> RankingPage {
        let outcomes: Vec<Outcome> = candidates
            .par_iter()
            .map(|property| self.evaluate(property, snapshot, as_of, &request.band))
            .collect();

        let mut excluded = 0;
        let mut matched = Vec::new();
        for outcome in outcomes {
            match outcome {
                Outcome::Ranked(deal) => matched.push(*deal),
                Outcome::Excluded => excluded += 1,
                Outcome::OutOfBand => {}
            }
        }

        matched.sort_by(|a, b| {
            b.metrics
                .value_diff_percent
                .partial_cmp(&a.metrics.value_diff_percent)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.property.id.cmp(&b.property.id))
        });

        let total = matched.len();
        let limit = request.limit.unwrap_or(self.config.default_limit);
        let items = matched
            .into_iter()
            .skip(request.offset)
            .take(limit)
            .collect();

        RankingPage {
            items,
            total,
            offset: request.offset,
            limit,
            excluded,
        }
    }

    fn evaluate(
        &self,
        property: &PropertyRecord,
        snapshot: &EconomicSnapshot,
        as_of: NaiveDate,
        band: &ValueBand,
    ) -> Outcome {
        let Some(actual) = property.actual_price() else {
            debug!("DealRanker: skipping {} (no price)", property.id);
            return Outcome::Excluded;
        };

        let investment_score = property
            .investment_score
            .filter(|s| (0.0..=10.0).contains(s))
            .unwrap_or_else(|| scoring::investment_score(property, snapshot, as_of));

        let Some((predicted, price_source)) =
            self.resolve_prediction(property, snapshot, as_of, actual, investment_score)
        else {
            debug!("DealRanker: skipping {} (no prediction)", property.id);
            return Outcome::Excluded;
        };

        let price_ratio = predicted / actual;
        if price_ratio > self.config.max_price_ratio || !is_price_in_bounds(predicted) {
            debug!(
                "DealRanker: excluding {} as implausible (predicted {:.0}, actual {:.0})",
                property.id, predicted, actual
            );
            return Outcome::Excluded;
        }

        let value_diff = predicted - actual;
        let value_diff_percent = value_diff / predicted * 100.0;
        if !band.contains(value_diff_percent) {
            return Outcome::OutOfBand;
        }

        Outcome::Ranked(Box::new(RankedDeal {
            property: property.clone(),
            analysis: DealAnalysis {
                predicted_price: predicted,
                price_source,
                investment_score,
                risk_level: scoring::risk_level(property, snapshot, as_of),
            },
            metrics: DealMetrics {
                actual_price: actual,
                value_diff,
                value_diff_percent,
                price_ratio,
                deal_quality: DealQuality::classify(value_diff_percent, investment_score),
            },
        }))
    }

    fn resolve_prediction(
        &self,
        property: &PropertyRecord,
        snapshot: &EconomicSnapshot,
        as_of: NaiveDate,
        actual: f64,
        investment_score: f64,
    ) -> Option<(f64, PriceSource)> {
        if let Some(existing) = property.ai_valuation.filter(|v| *v > 0.0) {
            return Some((existing, PriceSource::ExistingValuation));
        }

        if self.config.predict_missing {
            let features = self.assembler.assemble(property, snapshot, as_of);
            let hints = PropertyHints {
                city: property.city_name().map(str::to_string),
                lot_sqft: property.lot_sqft(),
            };
            let result = self.engine.predict(&features, &hints);
            return Some((
                result.predicted_price,
                PriceSource::Engine(result.method),
            ));
        }

        if let Some(sqft) = property.known_sqft() {
            let ppsf = property
                .city_name()
                .map(price_per_sqft)
                .unwrap_or(DEFAULT_PRICE_PER_SQFT);
            return Some((
                sqft * ppsf * type_multiplier(property.kind()),
                PriceSource::SizeBased,
            ));
        }

        let estimate = actual * (0.8 + 0.04 * investment_score);
        (estimate > 0.0).then_some((estimate, PriceSource::ScoreBased))
    }
}
