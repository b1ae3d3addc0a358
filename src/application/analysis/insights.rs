use crate::domain::economic::EconomicSnapshot;
use crate::domain::property::{PropertyRecord, PropertyType};
use chrono::{Datelike, NaiveDate};

pub const MAX_INSIGHTS: usize = 5;

/// Typical living area per property type, in square feet.
pub fn typical_sqft(kind: PropertyType) -> f64 {
    match kind {
        PropertyType::Condo => 850.0,
        PropertyType::Townhouse => 1400.0,
        PropertyType::Detached => 2000.0,
        PropertyType::SemiDetached => 1600.0,
        PropertyType::Apartment => 750.0,
    }
}

fn city_commentary(city: &str) -> Option<&'static str> {
    match city.to_lowercase().as_str() {
        "toronto" => Some("Toronto demand is supported by strong immigration and job growth"),
        "vancouver" => {
            Some("Vancouver supply is constrained by geography, supporting long-term values")
        }
        "montreal" => Some("Montreal remains relatively affordable among major Canadian markets"),
        "calgary" => Some("Calgary prices track energy-sector employment"),
        "ottawa" => Some("Ottawa's public-sector employment base keeps demand stable"),
        "edmonton" => Some("Edmonton offers low entry prices with energy-linked volatility"),
        "halifax" => Some("Halifax has seen sustained inbound migration pressure"),
        _ => None,
    }
}

/// Short observations about the property, most relevant first.
pub fn generate_insights(
    property: &PropertyRecord,
    snapshot: &EconomicSnapshot,
    as_of: NaiveDate,
) -> Vec<String> {
    let mut insights = Vec::new();
    let composites = &snapshot.composites;
    let indicators = &snapshot.indicators;

    if composites.interest_rate_environment >= 0.75 {
        insights.push(format!(
            "High policy rate ({:.2}%) is limiting buyer demand",
            indicators.policy_rate
        ));
    } else if composites.interest_rate_environment <= 0.25 {
        insights.push(format!(
            "Low policy rate ({:.2}%) supports buyer demand",
            indicators.policy_rate
        ));
    }
    if composites.affordability_pressure > 0.6 {
        insights.push(format!(
            "Affordability is stretched with 5-year mortgages at {:.2}%",
            indicators.mortgage_rate_5y
        ));
    }
    if composites.economic_momentum >= 0.75 {
        insights.push("Strong economic momentum favours price growth".to_string());
    } else if composites.economic_momentum < 0.0 {
        insights.push("Weak economic momentum may soften prices".to_string());
    }

    let kind = property.kind();
    if let Some(sqft) = property.known_sqft() {
        let typical = typical_sqft(kind);
        if sqft > typical * 1.2 {
            insights.push(format!(
                "Larger than a typical {} ({:.0} vs ~{:.0} sqft)",
                kind.label(),
                sqft,
                typical
            ));
        } else if sqft < typical * 0.8 {
            insights.push(format!(
                "Smaller than a typical {} ({:.0} vs ~{:.0} sqft)",
                kind.label(),
                sqft,
                typical
            ));
        }
    }

    if let Some(comment) = property.city_name().and_then(city_commentary) {
        insights.push(comment.to_string());
    }

    match as_of.month() {
        3..=5 => insights.push("Spring is peak listing season; expect competition".to_string()),
        11 | 12 | 1 | 2 => {
            insights.push("Winter listings see fewer buyers; room to negotiate".to_string())
        }
        _ => {}
    }

    match property.days_on_market {
        Some(dom) if dom > 60 => insights.push(format!(
            "On the market for {} days; seller may accept a lower offer",
            dom
        )),
        Some(dom) if dom < 7 => insights.push("New listing; likely to move quickly".to_string()),
        _ => {}
    }

    match property.age(as_of) {
        Some(age) if age > 50 => {
            insights.push(format!("Built {} years ago; budget for updates", age))
        }
        Some(age) if age < 5 => {
            insights.push("Recent construction with lower maintenance needs".to_string())
        }
        _ => {}
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capped_at_five() {
        let property = PropertyRecord {
            sqft: Some(4000.0),
            city: Some("Toronto".to_string()),
            year_built: Some(1920),
            days_on_market: Some(95),
            ..Default::default()
        };
        let snapshot = EconomicSnapshot::defaults();
        let as_of = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let insights = generate_insights(&property, &snapshot, as_of);
        assert_eq!(insights.len(), MAX_INSIGHTS);
        assert!(insights[0].contains("Larger than a typical Detached"));
        assert!(insights[1].starts_with("Toronto"));
    }

    #[test]
    fn test_quiet_property_has_few_insights() {
        let property = PropertyRecord {
            sqft: Some(2000.0),
            ..Default::default()
        };
        let as_of = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();
        let insights = generate_insights(&property, &EconomicSnapshot::defaults(), as_of);
        assert!(insights.is_empty());
    }
}
