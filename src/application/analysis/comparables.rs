use crate::domain::property::{PropertyRecord, same_city};
use crate::domain::valuation::ComparableProperty;
use chrono::NaiveDate;

pub const MAX_COMPARABLES: usize = 5;
pub const COMPARABLE_WINDOW_DAYS: i64 = 180;
pub const SQFT_TOLERANCE: f64 = 0.20;
pub const BEDROOM_TOLERANCE: u32 = 1;

/// Recent sales similar to `subject`, most recent first.
pub fn find_comparables(
    subject: &PropertyRecord,
    sales: &[PropertyRecord],
    as_of: NaiveDate,
) -> Vec<ComparableProperty> {
    let Some(city) = subject.city_name() else {
        return Vec::new();
    };
    let kind = subject.kind();
    let subject_sqft = subject.known_sqft();

    let mut matches: Vec<ComparableProperty> = sales
        .iter()
        .filter(|s| s.id != subject.id)
        .filter(|s| s.kind() == kind)
        .filter(|s| s.city_name().is_some_and(|c| same_city(city, c)))
        .filter(|s| match (subject_sqft, s.known_sqft()) {
            (Some(target), Some(sqft)) => (sqft - target).abs() <= target * SQFT_TOLERANCE,
            _ => true,
        })
        .filter(|s| match (subject.bedrooms, s.bedrooms) {
            (Some(target), Some(beds)) => target.abs_diff(beds) <= BEDROOM_TOLERANCE,
            (Some(_), None) => false,
            _ => true,
        })
        .filter_map(|s| {
            let sold_date = s.last_sold_date?;
            let sold_price = s.last_sold_price.filter(|p| *p > 0.0)?;
            let days = (as_of - sold_date).num_days();
            if !(0..=COMPARABLE_WINDOW_DAYS).contains(&days) {
                return None;
            }
            let sqft = s.known_sqft();
            Some(ComparableProperty {
                id: s.id,
                address: s.address.clone(),
                city: s.city.clone(),
                sold_price,
                sold_date,
                sqft,
                bedrooms: s.bedrooms,
                price_per_sqft: sqft.map(|a| sold_price / a),
            })
        })
        .collect();

    matches.sort_by(|a, b| b.sold_date.cmp(&a.sold_date).then(a.id.cmp(&b.id)));
    matches.truncate(MAX_COMPARABLES);
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn subject() -> PropertyRecord {
        PropertyRecord {
            id: 1,
            bedrooms: Some(3),
            sqft: Some(1500.0),
            city: Some("Toronto".to_string()),
            property_type: Some("Detached".to_string()),
            ..Default::default()
        }
    }

    fn sold(id: i64, days_ago: i64) -> PropertyRecord {
        PropertyRecord {
            id,
            last_sold_price: Some(900_000.0),
            last_sold_date: Some(as_of() - Duration::days(days_ago)),
            ..subject()
        }
    }

    #[test]
    fn test_filters() {
        let sales = vec![
            sold(2, 10),
            PropertyRecord {
                city: Some("North Toronto".to_string()),
                ..sold(3, 20)
            },
            PropertyRecord {
                sqft: Some(1900.0),
                ..sold(4, 5)
            },
            PropertyRecord {
                bedrooms: Some(5),
                ..sold(5, 5)
            },
            PropertyRecord {
                property_type: Some("Condo".to_string()),
                ..sold(6, 5)
            },
            sold(7, 181),
            PropertyRecord {
                city: Some("Ottawa".to_string()),
                ..sold(8, 1)
            },
            sold(1, 1),
        ];
        let ids: Vec<i64> = find_comparables(&subject(), &sales, as_of())
            .iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_capped_and_most_recent_first() {
        let sales: Vec<_> = (0..8).map(|i| sold(10 + i, 100 - i * 10)).collect();
        let comps = find_comparables(&subject(), &sales, as_of());
        assert_eq!(comps.len(), MAX_COMPARABLES);
        assert!(comps.windows(2).all(|w| w[0].sold_date >= w[1].sold_date));
        assert_eq!(comps[0].id, 17);
        assert_eq!(comps[0].price_per_sqft, Some(600.0));
    }

    #[test]
    fn test_unknown_subject_size_skips_size_filter() {
        let subject = PropertyRecord {
            sqft: None,
            bedrooms: None,
            ..subject()
        };
        let sales = vec![PropertyRecord {
            sqft: Some(4000.0),
            bedrooms: Some(6),
            ..sold(2, 3)
        }];
        assert_eq!(find_comparables(&subject, &sales, as_of()).len(), 1);
    }
}
