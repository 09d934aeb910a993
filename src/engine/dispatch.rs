use serde::Serialize;
use tracing::debug;

use crate::engine::drivers::{available_snapshot, validate_coordinates};
use crate::error::AppError;
use crate::geo::distance_km;
use crate::models::driver::DriverLocation;
use crate::store::Store;

#[derive(Debug, Clone, Copy)]
pub struct SearchDefaults {
    pub radius_km: f64,
    pub radius_search_limit: usize,
}

/// The two search endpoints differ only in whether results are capped by
/// default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchVariant {
    Nearby,
    RadiusSearch,
}

impl SearchVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchVariant::Nearby => "nearby",
            SearchVariant::RadiusSearch => "radius_search",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NearbyDriver {
    pub driver: DriverLocation,
    pub distance_km: f64,
}

/// Turns raw query values into search parameters. Blank values count as
/// absent.
pub fn parse_search(
    latitude: Option<&str>,
    longitude: Option<&str>,
    radius: Option<&str>,
    limit: Option<&str>,
    variant: SearchVariant,
    defaults: SearchDefaults,
) -> Result<SearchParams, AppError> {
    let (Some(raw_lat), Some(raw_lng)) = (non_blank(latitude), non_blank(longitude)) else {
        return Err(AppError::MissingCoordinates);
    };

    let latitude = parse_f64("latitude", raw_lat)?;
    let longitude = parse_f64("longitude", raw_lng)?;
    let radius_km = match non_blank(radius) {
        Some(raw) => parse_f64("radius", raw)?,
        None => defaults.radius_km,
    };

    let limit = match (non_blank(limit), variant) {
        (Some(raw), _) => Some(
            raw.parse::<usize>()
                .map_err(|_| AppError::InvalidNumeric("limit".to_string()))?,
        ),
        (None, SearchVariant::RadiusSearch) => Some(defaults.radius_search_limit),
        (None, SearchVariant::Nearby) => None,
    };

    Ok(SearchParams {
        latitude,
        longitude,
        radius_km,
        limit,
    })
}

/// Available drivers within `radius_km` of the point, nearest first. Equal
/// distances keep registration order.
pub fn find_nearby(store: &Store, params: SearchParams) -> Result<Vec<NearbyDriver>, AppError> {
    validate_coordinates(params.latitude, params.longitude)?;
    if !params.radius_km.is_finite() {
        return Err(AppError::InvalidNumeric("radius".to_string()));
    }
    if params.radius_km <= 0.0 {
        return Err(AppError::Validation("radius must be greater than 0".to_string()));
    }

    let snapshot = available_snapshot(store);
    let scanned = snapshot.len();

    let mut matches: Vec<NearbyDriver> = snapshot
        .into_iter()
        .filter_map(|driver| {
            let (lat, lng) = driver.coordinates()?;
            let distance = distance_km(params.longitude, params.latitude, lng, lat);

            (distance <= params.radius_km).then_some(NearbyDriver {
                driver,
                distance_km: distance,
            })
        })
        .collect();

    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    if let Some(limit) = params.limit {
        matches.truncate(limit);
    }

    debug!(
        scanned,
        matched = matches.len(),
        radius_km = params.radius_km,
        "nearby driver search"
    );

    Ok(matches)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_f64(field: &str, raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::InvalidNumeric(field.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::drivers::set_availability;
    use crate::engine::testing::{available_driver_at, driver};

    const DEFAULTS: SearchDefaults = SearchDefaults {
        radius_km: 5.0,
        radius_search_limit: 5,
    };

    fn params(lat: f64, lng: f64, radius_km: f64, limit: Option<usize>) -> SearchParams {
        SearchParams {
            latitude: lat,
            longitude: lng,
            radius_km,
            limit,
        }
    }

    #[test]
    fn radius_boundary_around_one_degree() {
        let store = Store::new();
        let id = available_driver_at(&store, "equator", 0.0, 0.0);

        let excluded = find_nearby(&store, params(0.0, 1.0, 100.0, None)).unwrap();
        assert!(excluded.is_empty());

        let included = find_nearby(&store, params(0.0, 1.0, 120.0, None)).unwrap();
        assert_eq!(included.len(), 1);
        assert_eq!(included[0].driver.driver_id, id);
        assert!((included[0].distance_km - 111.19).abs() < 0.1);
    }

    #[test]
    fn results_are_sorted_and_filtered() {
        let store = Store::new();
        let far = available_driver_at(&store, "far", -1.30, 36.85);
        let near = available_driver_at(&store, "near", -1.2922, 36.8220);
        let offline = available_driver_at(&store, "offline", -1.2921, 36.8219);
        set_availability(&store, offline, false).unwrap();
        driver(&store, "nowhere");

        let found = find_nearby(&store, params(-1.2921, 36.8219, 10.0, None)).unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.driver.driver_id).collect();

        assert_eq!(ids, vec![near, far]);
        assert!(found.windows(2).all(|w| w[0].distance_km <= w[1].distance_km));
    }

    #[test]
    fn ties_keep_registration_order() {
        let store = Store::new();
        let first = available_driver_at(&store, "first", 0.01, 0.0);
        let second = available_driver_at(&store, "second", 0.01, 0.0);
        let third = available_driver_at(&store, "third", 0.01, 0.0);

        let found = find_nearby(&store, params(0.0, 0.0, 5.0, None)).unwrap();
        let ids: Vec<_> = found.iter().map(|n| n.driver.driver_id).collect();
        assert_eq!(ids, vec![first, second, third]);
    }

    #[test]
    fn limit_truncates_results() {
        let store = Store::new();
        for i in 0..8 {
            available_driver_at(&store, &format!("d{i}"), 0.001 * i as f64, 0.0);
        }

        let found = find_nearby(&store, params(0.0, 0.0, 5.0, Some(3))).unwrap();
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        let store = Store::new();
        assert!(matches!(
            find_nearby(&store, params(0.0, 0.0, 0.0, None)),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn missing_coordinates_are_reported() {
        let result = parse_search(Some("1.0"), None, None, None, SearchVariant::Nearby, DEFAULTS);
        assert!(matches!(result, Err(AppError::MissingCoordinates)));

        let blank = parse_search(Some(" "), Some("2.0"), None, None, SearchVariant::Nearby, DEFAULTS);
        assert!(matches!(blank, Err(AppError::MissingCoordinates)));
    }

    #[test]
    fn unparsable_numbers_are_reported() {
        let radius = parse_search(
            Some("1.0"),
            Some("2.0"),
            Some("far"),
            None,
            SearchVariant::Nearby,
            DEFAULTS,
        );
        assert!(matches!(radius, Err(AppError::InvalidNumeric(field)) if field == "radius"));

        let nan = parse_search(Some("NaN"), Some("2.0"), None, None, SearchVariant::Nearby, DEFAULTS);
        assert!(matches!(nan, Err(AppError::InvalidNumeric(field)) if field == "latitude"));
    }

    #[test]
    fn defaults_depend_on_variant() {
        let nearby =
            parse_search(Some("1"), Some("2"), None, None, SearchVariant::Nearby, DEFAULTS).unwrap();
        assert_eq!(nearby.radius_km, 5.0);
        assert_eq!(nearby.limit, None);

        let radius = parse_search(
            Some("1"),
            Some("2"),
            Some("12.5"),
            None,
            SearchVariant::RadiusSearch,
            DEFAULTS,
        )
        .unwrap();
        assert_eq!(radius.radius_km, 12.5);
        assert_eq!(radius.limit, Some(5));
    }
}
