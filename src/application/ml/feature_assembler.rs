use crate::domain::economic::EconomicSnapshot;
use crate::domain::errors::ValuationError;
use crate::domain::ml::feature_registry::{FEATURE_COUNT, FeatureVector, slot};
use crate::domain::property::{PropertyRecord, PropertyType, city_code};
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

pub const DEFAULT_BEDROOMS: f64 = 3.0;
pub const DEFAULT_BATHROOMS: f64 = 2.0;
pub const DEFAULT_SQFT: f64 = 1500.0;
pub const DEFAULT_LOT_SIZE: f64 = 0.25;
pub const DEFAULT_ROOMS: f64 = 7.0;
pub const DEFAULT_YEAR_BUILT: f64 = 2010.0;
pub const DEFAULT_DAYS_ON_MARKET: f64 = 30.0;
pub const DEFAULT_ANNUAL_TAXES: f64 = 5000.0;

/// Raw feature values keyed by canonical feature name, applied after assembly.
pub type FeatureOverrides = HashMap<String, f64>;

/// Builds the 26-slot model input from a property and an economic snapshot.
///
/// Missing property fields take fixed defaults so assembly is total; the
/// reference date supplies the current year and month slots.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureAssembler;

impl FeatureAssembler {
    pub fn new() -> Self {
        Self
    }

    pub fn assemble(
        &self,
        property: &PropertyRecord,
        snapshot: &EconomicSnapshot,
        as_of: NaiveDate,
    ) -> FeatureVector {
        let sqft = property.known_sqft().unwrap_or(DEFAULT_SQFT);
        let kind = property.kind();
        let ind = &snapshot.indicators;
        let comp = &snapshot.composites;

        let mut values = [0.0; FEATURE_COUNT];
        values[slot::BEDROOMS] = property.bedrooms.map(f64::from).unwrap_or(DEFAULT_BEDROOMS);
        values[slot::BATHROOMS] = property
            .bathrooms
            .filter(|b| *b >= 0.0)
            .unwrap_or(DEFAULT_BATHROOMS);
        values[slot::SQFT] = sqft;
        values[slot::LOT_SIZE] = property
            .lot_size
            .filter(|l| *l > 0.0)
            .unwrap_or(DEFAULT_LOT_SIZE);
        values[slot::ROOMS] = property
            .rooms
            .filter(|r| *r > 0)
            .map(f64::from)
            .unwrap_or(DEFAULT_ROOMS);
        values[slot::CITY_CODE] = city_code(property.city_name());
        values[slot::PROVINCE_CODE] = property.province_code().code();
        values[slot::PROPERTY_TYPE_CODE] = kind.code();
        values[slot::YEAR_BUILT] = property
            .year_built
            .filter(|y| *y > 1600)
            .map(f64::from)
            .unwrap_or(DEFAULT_YEAR_BUILT);
        values[slot::CURRENT_YEAR] = as_of.year() as f64;
        values[slot::CURRENT_MONTH] = as_of.month() as f64;
        values[slot::DAYS_ON_MARKET] = property
            .days_on_market
            .map(f64::from)
            .unwrap_or(DEFAULT_DAYS_ON_MARKET);
        values[slot::ANNUAL_TAXES] = property
            .annual_taxes
            .filter(|t| *t >= 0.0)
            .unwrap_or(DEFAULT_ANNUAL_TAXES);

        values[slot::POLICY_RATE] = ind.policy_rate;
        values[slot::PRIME_RATE] = ind.prime_rate;
        values[slot::MORTGAGE_RATE_5Y] = ind.mortgage_rate_5y;
        values[slot::INFLATION_RATE] = ind.inflation_rate;
        values[slot::UNEMPLOYMENT_RATE] = ind.unemployment_rate;
        values[slot::EXCHANGE_RATE] = ind.exchange_rate;
        values[slot::GDP_GROWTH] = ind.gdp_growth;

        values[slot::INTEREST_RATE_ENVIRONMENT] = comp.interest_rate_environment;
        values[slot::ECONOMIC_MOMENTUM] = comp.economic_momentum;
        values[slot::AFFORDABILITY_PRESSURE] = comp.affordability_pressure;
        values[slot::PROPERTY_AFFORDABILITY] =
            property_affordability(sqft, ind.mortgage_rate_5y, ind.inflation_rate);
        values[slot::PROPERTY_ECONOMIC_SENSITIVITY] = property_economic_sensitivity(
            kind,
            comp.interest_rate_environment,
            comp.economic_momentum,
        );
        values[slot::MARKET_TIMING] = market_timing(
            ind.policy_rate,
            comp.economic_momentum,
            comp.affordability_pressure,
        );

        FeatureVector::new(values)
    }

    /// Assemble, then overwrite named slots with caller-supplied raw values.
    pub fn assemble_with_overrides(
        &self,
        property: &PropertyRecord,
        snapshot: &EconomicSnapshot,
        as_of: NaiveDate,
        overrides: &FeatureOverrides,
    ) -> Result<FeatureVector, ValuationError> {
        let mut vector = self.assemble(property, snapshot, as_of);
        for (name, value) in overrides {
            vector.set_named(name, *value)?;
        }
        Ok(vector)
    }

    /// Feature vector for an all-defaults property, used as an inference canary.
    pub fn canary(snapshot: &EconomicSnapshot, as_of: NaiveDate) -> FeatureVector {
        Self.assemble(&PropertyRecord::default(), snapshot, as_of)
    }
}

pub fn property_affordability(sqft: f64, mortgage_rate: f64, inflation_rate: f64) -> f64 {
    let burden =
        0.6 * mortgage_rate / 10.0 + 0.2 * inflation_rate / 5.0 + 0.2 * (sqft / 2000.0 - 1.0);
    (1.0 - burden).clamp(0.0, 1.0)
}

pub fn base_sensitivity(kind: PropertyType) -> f64 {
    match kind {
        PropertyType::Condo => 0.8,
        PropertyType::Townhouse => 0.6,
        PropertyType::Detached => 0.4,
        PropertyType::SemiDetached => 0.5,
        PropertyType::Apartment => 0.9,
    }
}

/// Base sensitivity nudged up in tight-rate environments and down with momentum.
pub fn property_economic_sensitivity(
    kind: PropertyType,
    interest_rate_environment: f64,
    economic_momentum: f64,
) -> f64 {
    (base_sensitivity(kind) + 0.2 * (interest_rate_environment - 0.5) - 0.1 * economic_momentum)
        .clamp(0.0, 1.0)
}

pub fn market_timing(policy_rate: f64, economic_momentum: f64, affordability_pressure: f64) -> f64 {
    (0.4 * (1.0 - policy_rate / 8.0)
        + 0.3 * ((economic_momentum + 1.0) / 2.0)
        + 0.3 * (1.0 - affordability_pressure))
        .clamp(0.0, 1.0)
}
