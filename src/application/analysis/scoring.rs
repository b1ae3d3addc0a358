//! Investment score, risk level and market trend.
//!
//! All functions are pure: they read the property, the published economic
//! snapshot and a reference date, nothing else.

use crate::domain::economic::EconomicSnapshot;
use crate::domain::property::{PropertyRecord, PropertyType, same_city};
use crate::domain::valuation::{MarketTrend, RiskLevel};
use chrono::NaiveDate;
use statrs::statistics::{Data, Distribution};

pub const BASE_SCORE: f64 = 5.0;
pub const BASELINE_DESIRABILITY: f64 = 6.0;
pub const TREND_WINDOW_DAYS: i64 = 180;
pub const TREND_MIN_SALES: usize = 10;
pub const TREND_SAMPLE: usize = 15;
pub const TREND_THRESHOLD_PCT: f64 = 5.0;

/// Location desirability on a 0-10 scale; unknown cities sit at the baseline.
const CITY_DESIRABILITY: &[(&str, f64)] = &[
    ("toronto", 9.0),
    ("vancouver", 9.0),
    ("west vancouver", 9.5),
    ("north vancouver", 8.5),
    ("oakville", 8.5),
    ("richmond hill", 8.0),
    ("markham", 8.0),
    ("burnaby", 8.0),
    ("victoria", 8.0),
    ("ottawa", 8.0),
    ("montreal", 8.0),
    ("mississauga", 7.5),
    ("vaughan", 7.5),
    ("burlington", 7.5),
    ("waterloo", 7.5),
    ("calgary", 7.5),
    ("halifax", 7.0),
    ("kitchener", 7.0),
    ("guelph", 7.0),
    ("quebec city", 7.0),
    ("kelowna", 7.0),
    ("hamilton", 6.5),
    ("edmonton", 6.5),
    ("london", 6.5),
    ("surrey", 6.5),
    ("brampton", 6.5),
    ("winnipeg", 6.0),
    ("saskatoon", 6.0),
    ("regina", 5.5),
    ("windsor", 5.5),
];

/// Markets with deep, liquid demand.
const LOW_RISK_CITIES: &[&str] = &[
    "toronto",
    "vancouver",
    "ottawa",
    "montreal",
    "calgary",
    "oakville",
    "west vancouver",
];

/// Markets tied to a single industry or with thin demand.
const HIGH_RISK_CITIES: &[&str] = &[
    "fort mcmurray",
    "grande prairie",
    "sudbury",
    "thunder bay",
    "saint john",
    "sydney",
    "windsor",
];

fn city_key(property: &PropertyRecord) -> Option<String> {
    property.city_name().map(|c| c.to_lowercase())
}

pub fn desirability(city: Option<&str>) -> f64 {
    let Some(city) = city else {
        return BASELINE_DESIRABILITY;
    };
    let key = city.trim().to_lowercase();
    CITY_DESIRABILITY
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, d)| *d)
        .unwrap_or(BASELINE_DESIRABILITY)
}

pub fn type_preference(kind: PropertyType) -> f64 {
    match kind {
        PropertyType::Detached => 0.5,
        PropertyType::SemiDetached => 0.3,
        PropertyType::Townhouse => 0.2,
        PropertyType::Condo => 0.0,
        PropertyType::Apartment => -0.2,
    }
}

/// Investment attractiveness in [0, 10].
pub fn investment_score(
    property: &PropertyRecord,
    snapshot: &EconomicSnapshot,
    as_of: NaiveDate,
) -> f64 {
    let mut score = BASE_SCORE;

    score += (desirability(property.city_name()) - BASELINE_DESIRABILITY) * 0.1;
    score += type_preference(property.kind());

    if let Some(sqft) = property.known_sqft() {
        if sqft > 2500.0 {
            score += 0.5;
        } else if sqft < 1000.0 {
            score -= 0.3;
        }
    }

    if let Some(age) = property.age(as_of) {
        if age < 5 {
            score += 0.3;
        } else if age > 50 {
            score -= 0.5;
        } else if age > 30 {
            score -= 0.2;
        }
    }

    let composites = &snapshot.composites;
    score += (1.0 - composites.interest_rate_environment) * 0.5;
    score += composites.economic_momentum * 0.3;

    // Long exposure means negotiating room; a very fresh listing means competition
    if let Some(dom) = property.days_on_market {
        if dom > 60 {
            score += 0.3;
        } else if dom < 7 {
            score -= 0.2;
        }
    }

    score.clamp(0.0, 10.0)
}

/// Signed risk counter before it is bucketed into a [`RiskLevel`].
pub fn risk_counter(
    property: &PropertyRecord,
    snapshot: &EconomicSnapshot,
    as_of: NaiveDate,
) -> i32 {
    let mut counter = 0;

    if let Some(city) = city_key(property) {
        if LOW_RISK_CITIES.contains(&city.as_str()) {
            counter -= 1;
        } else if HIGH_RISK_CITIES.contains(&city.as_str()) {
            counter += 1;
        }
    }

    match property.kind() {
        PropertyType::Condo | PropertyType::Apartment => counter += 1,
        PropertyType::Detached => counter -= 1,
        PropertyType::Townhouse | PropertyType::SemiDetached => {}
    }

    let composites = &snapshot.composites;
    if composites.interest_rate_environment >= 0.75 {
        counter += 1;
    } else if composites.interest_rate_environment <= 0.25 {
        counter -= 1;
    }
    if composites.affordability_pressure > 0.7 {
        counter += 1;
    } else if composites.affordability_pressure < 0.3 {
        counter -= 1;
    }

    if property.age(as_of).is_some_and(|age| age > 40) {
        counter += 1;
    }
    if property.days_on_market.is_some_and(|dom| dom > 90) {
        counter += 1;
    }

    counter
}

pub fn risk_level(
    property: &PropertyRecord,
    snapshot: &EconomicSnapshot,
    as_of: NaiveDate,
) -> RiskLevel {
    RiskLevel::from_counter(risk_counter(property, snapshot, as_of))
}

/// Direction of recent sale prices for the subject's city and type.
pub fn market_trend(
    subject: &PropertyRecord,
    sales: &[PropertyRecord],
    as_of: NaiveDate,
) -> MarketTrend {
    let Some(city) = subject.city_name() else {
        return MarketTrend::InsufficientData;
    };
    let kind = subject.kind();

    let mut recent: Vec<(NaiveDate, f64)> = sales
        .iter()
        .filter(|s| s.id != subject.id)
        .filter(|s| s.kind() == kind)
        .filter(|s| s.city_name().is_some_and(|c| same_city(city, c)))
        .filter_map(|s| {
            let date = s.last_sold_date?;
            let price = s.last_sold_price.filter(|p| *p > 0.0)?;
            let days = (as_of - date).num_days();
            (0..=TREND_WINDOW_DAYS).contains(&days).then_some((date, price))
        })
        .collect();

    if recent.len() < TREND_MIN_SALES {
        return MarketTrend::InsufficientData;
    }

    recent.sort_by(|a, b| b.0.cmp(&a.0));
    // Newest and oldest samples never share a sale.
    let sample = TREND_SAMPLE.min(recent.len() / 2);
    let newest: Vec<f64> = recent[..sample].iter().map(|(_, p)| *p).collect();
    let oldest: Vec<f64> = recent[recent.len() - sample..].iter().map(|(_, p)| *p).collect();

    let (Some(newest_mean), Some(oldest_mean)) =
        (Data::new(newest).mean(), Data::new(oldest).mean())
    else {
        return MarketTrend::InsufficientData;
    };
    if oldest_mean <= 0.0 {
        return MarketTrend::InsufficientData;
    }

    let change_pct = (newest_mean - oldest_mean) / oldest_mean * 100.0;
    if change_pct > TREND_THRESHOLD_PCT {
        MarketTrend::Rising
    } else if change_pct < -TREND_THRESHOLD_PCT {
        MarketTrend::Declining
    } else {
        MarketTrend::Stable
    }
}
