//! Property records as handed to the engine by the storage layer.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Immutable snapshot of a listing or sold property.
///
/// Every scalar is optional. Values arriving as strings are parsed, anything
/// unparsable or non-finite deserializes to `None` instead of failing the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub id: i64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub bedrooms: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub bathrooms: Option<f64>,
    /// Living area in square feet.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub sqft: Option<f64>,
    /// Acres when below 100, square feet otherwise.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub lot_size: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub rooms: Option<u32>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i32")]
    pub year_built: Option<i32>,
    #[serde(default, deserialize_with = "lenient::opt_u32")]
    pub days_on_market: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub annual_taxes: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub listed_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub last_sold_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_date")]
    pub last_sold_date: Option<NaiveDate>,
    /// Valuation persisted by a previous run, if any.
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ai_valuation: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub investment_score: Option<f64>,
}

impl PropertyRecord {
    pub fn kind(&self) -> PropertyType {
        self.property_type
            .as_deref()
            .map(PropertyType::parse)
            .unwrap_or_default()
    }

    pub fn province_code(&self) -> Province {
        self.province
            .as_deref()
            .map(Province::parse)
            .unwrap_or_default()
    }

    /// Positive living area, if known.
    pub fn known_sqft(&self) -> Option<f64> {
        self.sqft.filter(|v| *v > 0.0)
    }

    pub fn age(&self, as_of: NaiveDate) -> Option<i32> {
        self.year_built
            .filter(|y| *y > 1600)
            .map(|y| (as_of.year() - y).max(0))
    }

    /// Listed price when positive, else last sold price.
    pub fn actual_price(&self) -> Option<f64> {
        self.listed_price
            .filter(|p| *p > 0.0)
            .or(self.last_sold_price.filter(|p| *p > 0.0))
    }

    pub fn city_name(&self) -> Option<&str> {
        self.city.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Lot size normalised to square feet.
    pub fn lot_sqft(&self) -> Option<f64> {
        self.lot_size.filter(|v| *v > 0.0).map(|v| {
            if v < 100.0 {
                v * SQFT_PER_ACRE
            } else {
                v
            }
        })
    }
}

pub const SQFT_PER_ACRE: f64 = 43_560.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PropertyType {
    Condo,
    Townhouse,
    #[default]
    Detached,
    #[serde(rename = "Semi-Detached")]
    SemiDetached,
    Apartment,
}

impl PropertyType {
    pub const ALL: [PropertyType; 5] = [
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::Detached,
        PropertyType::SemiDetached,
        PropertyType::Apartment,
    ];

    /// Lenient parse; anything unrecognised is a detached house.
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "condo" | "condominium" | "condoapt" | "condoapartment" => Self::Condo,
            "townhouse" | "townhome" | "town" | "row" | "rowhouse" | "condotownhouse" => {
                Self::Townhouse
            }
            "semidetached" | "semi" | "duplex" => Self::SemiDetached,
            "apartment" | "apt" | "flat" => Self::Apartment,
            _ => Self::Detached,
        }
    }

    /// Categorical encoding used in the feature vector.
    pub fn code(&self) -> f64 {
        match self {
            Self::Condo => 1.0,
            Self::Townhouse => 2.0,
            Self::Detached => 3.0,
            Self::SemiDetached => 4.0,
            Self::Apartment => 5.0,
        }
    }

    pub fn from_code(code: f64) -> Self {
        match code.round() as i64 {
            1 => Self::Condo,
            2 => Self::Townhouse,
            4 => Self::SemiDetached,
            5 => Self::Apartment,
            _ => Self::Detached,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Condo => "Condo",
            Self::Townhouse => "Townhouse",
            Self::Detached => "Detached",
            Self::SemiDetached => "Semi-Detached",
            Self::Apartment => "Apartment",
        }
    }

    pub fn has_land(&self) -> bool {
        matches!(self, Self::Detached | Self::SemiDetached)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Province {
    #[default]
    ON,
    QC,
    BC,
    AB,
    MB,
    SK,
    NS,
    NB,
    NL,
    PE,
}

impl Province {
    /// Accepts two-letter codes or full names; unknown values map to Ontario.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "qc" | "quebec" | "québec" => Self::QC,
            "bc" | "british columbia" => Self::BC,
            "ab" | "alberta" => Self::AB,
            "mb" | "manitoba" => Self::MB,
            "sk" | "saskatchewan" => Self::SK,
            "ns" | "nova scotia" => Self::NS,
            "nb" | "new brunswick" => Self::NB,
            "nl" | "newfoundland" | "newfoundland and labrador" => Self::NL,
            "pe" | "pei" | "prince edward island" => Self::PE,
            _ => Self::ON,
        }
    }

    pub fn code(&self) -> f64 {
        match self {
            Self::ON => 10.0,
            Self::QC => 20.0,
            Self::BC => 30.0,
            Self::AB => 40.0,
            Self::MB => 50.0,
            Self::SK => 60.0,
            Self::NS => 70.0,
            Self::NB => 80.0,
            Self::NL => 90.0,
            Self::PE => 100.0,
        }
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Stable city encoding in [0, 100): FNV-1a 64 over the trimmed, lowercased
/// name. Missing names encode as "unknown". Models must be trained against
/// this exact function.
pub fn city_code(city: Option<&str>) -> f64 {
    let normalized = city
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    let hash = normalized.bytes().fold(FNV_OFFSET_BASIS, |acc, byte| {
        (acc ^ byte as u64).wrapping_mul(FNV_PRIME)
    });
    (hash % 100) as f64
}

/// Case-insensitive substring match in either direction ("Toronto" ~ "North Toronto").
pub fn same_city(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

mod lenient {
    use super::*;
    use serde_json::Value;

    fn number(value: Option<Value>) -> Option<f64> {
        let parsed = match value? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace([',', '$'], "").parse::<f64>().ok(),
            _ => None,
        }?;
        parsed.is_finite().then_some(parsed)
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(number(Option::<Value>::deserialize(d)?))
    }

    pub fn opt_u32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(number(Option::<Value>::deserialize(d)?)
            .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| v.round() as u32))
    }

    pub fn opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
        Ok(number(Option::<Value>::deserialize(d)?)
            .filter(|v| v.abs() <= i32::MAX as f64)
            .map(|v| v.round() as i32))
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let value = Option::<Value>::deserialize(d)?;
        Ok(match value {
            Some(Value::String(s)) => {
                let s = s.trim();
                // Accept both plain dates and full timestamps
                NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d").ok()
            }
            _ => None,
        })
    }
}
