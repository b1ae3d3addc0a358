//! Deterministic rule-based price estimate used when no model can answer.

use crate::domain::ml::feature_registry::{FeatureVector, slot};
use crate::domain::property::{PropertyType, city_code};
use std::collections::HashMap;
use std::sync::LazyLock;

pub const DEFAULT_PRICE_PER_SQFT: f64 = 500.0;

/// Average price per square foot by city (lowercase).
const CITY_PRICE_PER_SQFT: &[(&str, f64)] = &[
    ("toronto", 600.0),
    ("vancouver", 700.0),
    ("north vancouver", 680.0),
    ("west vancouver", 820.0),
    ("burnaby", 620.0),
    ("richmond", 600.0),
    ("surrey", 480.0),
    ("victoria", 560.0),
    ("kelowna", 420.0),
    ("oakville", 620.0),
    ("mississauga", 520.0),
    ("markham", 560.0),
    ("richmond hill", 580.0),
    ("vaughan", 540.0),
    ("brampton", 450.0),
    ("hamilton", 420.0),
    ("burlington", 500.0),
    ("ottawa", 400.0),
    ("kitchener", 380.0),
    ("waterloo", 390.0),
    ("guelph", 400.0),
    ("london", 340.0),
    ("windsor", 260.0),
    ("montreal", 380.0),
    ("laval", 330.0),
    ("quebec city", 260.0),
    ("gatineau", 280.0),
    ("calgary", 330.0),
    ("edmonton", 260.0),
    ("winnipeg", 250.0),
    ("saskatoon", 240.0),
    ("regina", 230.0),
    ("halifax", 320.0),
    ("moncton", 200.0),
    ("fredericton", 190.0),
    ("st. john's", 210.0),
    ("charlottetown", 230.0),
];

/// Same table keyed by city code; colliding cities are averaged.
static PRICE_PER_SQFT_BY_CODE: LazyLock<HashMap<u64, f64>> = LazyLock::new(|| {
    let mut sums: HashMap<u64, (f64, usize)> = HashMap::new();
    for (city, ppsf) in CITY_PRICE_PER_SQFT {
        let entry = sums
            .entry(city_code(Some(city)) as u64)
            .or_insert((0.0, 0));
        entry.0 += ppsf;
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(code, (sum, n))| (code, sum / n as f64))
        .collect()
});

pub fn price_per_sqft(city: &str) -> f64 {
    let key = city.trim().to_lowercase();
    CITY_PRICE_PER_SQFT
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, ppsf)| *ppsf)
        .unwrap_or(DEFAULT_PRICE_PER_SQFT)
}

pub fn price_per_sqft_for_code(code: f64) -> f64 {
    PRICE_PER_SQFT_BY_CODE
        .get(&(code.max(0.0) as u64))
        .copied()
        .unwrap_or(DEFAULT_PRICE_PER_SQFT)
}

pub fn type_multiplier(kind: PropertyType) -> f64 {
    match kind {
        PropertyType::Detached => 1.2,
        PropertyType::SemiDetached => 1.05,
        PropertyType::Townhouse => 0.95,
        PropertyType::Condo => 0.85,
        PropertyType::Apartment => 0.7,
    }
}

/// Context a feature vector cannot carry on its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyHints {
    /// Resolves the price table by name instead of by hashed code.
    pub city: Option<String>,
    /// Lot size in square feet.
    pub lot_sqft: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatisticalEstimate {
    /// Unclamped estimate.
    pub price: f64,
    pub base_price: f64,
    pub adjustments: f64,
    pub market_factor: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StatisticalEstimator;

impl StatisticalEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate(&self, features: &FeatureVector, hints: &PropertyHints) -> StatisticalEstimate {
        let sqft = features.get(slot::SQFT).max(0.0);
        let kind = PropertyType::from_code(features.get(slot::PROPERTY_TYPE_CODE));
        let ppsf = match hints.city.as_deref() {
            Some(city) => price_per_sqft(city),
            None => price_per_sqft_for_code(features.get(slot::CITY_CODE)),
        };

        let base_price = sqft * ppsf * type_multiplier(kind);

        let mut adjustments = 0.0;
        adjustments += (features.get(slot::BEDROOMS) - 3.0) * 15_000.0;
        adjustments += (features.get(slot::BATHROOMS) - 2.0) * 10_000.0;

        let age = features.get(slot::CURRENT_YEAR) - features.get(slot::YEAR_BUILT);
        adjustments += if age > 50.0 {
            -50_000.0
        } else if age > 20.0 {
            -20_000.0
        } else if age < 5.0 {
            30_000.0
        } else {
            0.0
        };

        // Only a lot size already in square feet counts when no hint is given
        let lot_sqft = hints.lot_sqft.or_else(|| {
            let raw = features.get(slot::LOT_SIZE);
            (raw >= 100.0).then_some(raw)
        });
        if kind.has_land() {
            adjustments += match lot_sqft {
                Some(lot) if lot > 6000.0 => 50_000.0,
                Some(lot) if lot > 4000.0 => 25_000.0,
                _ => 0.0,
            };
        }

        let market_factor = 0.9 + 0.2 * features.get(slot::MARKET_TIMING).clamp(0.0, 1.0);

        StatisticalEstimate {
            price: (base_price + adjustments) * market_factor,
            base_price,
            adjustments,
            market_factor,
        }
    }
}
