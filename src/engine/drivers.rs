use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::driver::{BackgroundCheckStatus, DriverLocation, DriverProfile, Vehicle};
use crate::models::user::User;
use crate::store::Store;

pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub phone_number: String,
    pub is_driver: bool,
    pub license_number: Option<String>,
    pub vehicle: Option<Vehicle>,
}

/// Creates the user and, for drivers, the driver profile that dispatch
/// searches over. A new driver starts unavailable and without a position.
pub fn register_user(store: &Store, new_user: NewUser) -> Result<User, AppError> {
    if new_user.username.trim().is_empty() {
        return Err(AppError::Validation("username cannot be empty".to_string()));
    }

    let id = Uuid::new_v4();
    match store.usernames.entry(new_user.username.clone()) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "username {} is already registered",
                new_user.username
            )));
        }
        Entry::Vacant(slot) => {
            slot.insert(id);
        }
    }

    let user = User {
        id,
        username: new_user.username,
        full_name: new_user.full_name,
        phone_number: new_user.phone_number,
        is_driver: new_user.is_driver,
        created_at: Utc::now(),
    };

    if user.is_driver {
        let profile = DriverProfile {
            user_id: user.id,
            license_number: new_user.license_number.unwrap_or_default(),
            vehicle: new_user.vehicle.unwrap_or_default(),
            background_check_status: BackgroundCheckStatus::Pending,
            location: DriverLocation {
                driver_id: user.id,
                latitude: None,
                longitude: None,
                is_available: false,
                updated_at: None,
            },
            registered_seq: store.next_driver_seq(),
        };
        store.drivers.insert(user.id, profile);
    }

    store.users.insert(user.id, user.clone());
    info!(user_id = %user.id, is_driver = user.is_driver, "user registered");

    Ok(user)
}

pub fn driver_profile(store: &Store, driver_id: Uuid) -> Result<DriverProfile, AppError> {
    store
        .drivers
        .get(&driver_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("driver profile {driver_id} not found")))
}

pub fn list_drivers(store: &Store) -> Vec<DriverProfile> {
    let mut drivers: Vec<DriverProfile> = store
        .drivers
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    drivers.sort_by_key(|d| d.registered_seq);
    drivers
}

pub fn update_location(
    store: &Store,
    driver_id: Uuid,
    latitude: f64,
    longitude: f64,
) -> Result<DriverLocation, AppError> {
    validate_coordinates(latitude, longitude)?;

    let mut profile = store
        .drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver profile {driver_id} not found")))?;

    profile.location.latitude = Some(latitude);
    profile.location.longitude = Some(longitude);
    profile.location.updated_at = Some(Utc::now());

    debug!(driver_id = %driver_id, latitude, longitude, "driver location updated");
    Ok(profile.location.clone())
}

/// Location write coming from the realtime channel; unknown identities are
/// ignored.
pub fn try_update_location(store: &Store, driver_id: Uuid, latitude: f64, longitude: f64) -> bool {
    match update_location(store, driver_id, latitude, longitude) {
        Ok(_) => true,
        Err(err) => {
            debug!(driver_id = %driver_id, error = %err, "location update skipped");
            false
        }
    }
}

pub fn set_availability(
    store: &Store,
    driver_id: Uuid,
    is_available: bool,
) -> Result<DriverLocation, AppError> {
    let mut profile = store
        .drivers
        .get_mut(&driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver profile {driver_id} not found")))?;

    profile.location.is_available = is_available;
    info!(driver_id = %driver_id, is_available, "driver availability changed");

    Ok(profile.location.clone())
}

/// Point-in-time copy of every available driver that has both coordinates,
/// in registration order.
pub fn available_snapshot(store: &Store) -> Vec<DriverLocation> {
    let mut eligible: Vec<(u64, DriverLocation)> = store
        .drivers
        .iter()
        .filter_map(|entry| {
            let profile = entry.value();
            let location = &profile.location;

            if location.is_available && location.coordinates().is_some() {
                Some((profile.registered_seq, location.clone()))
            } else {
                None
            }
        })
        .collect();

    eligible.sort_by_key(|(seq, _)| *seq);
    eligible.into_iter().map(|(_, location)| location).collect()
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), AppError> {
    if !latitude.is_finite() {
        return Err(AppError::InvalidNumeric("latitude".to_string()));
    }
    if !longitude.is_finite() {
        return Err(AppError::InvalidNumeric("longitude".to_string()));
    }
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(AppError::Validation(format!(
            "latitude {latitude} is outside [-90, 90]"
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::Validation(format!(
            "longitude {longitude} is outside [-180, 180]"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::engine::testing::driver;

    #[test]
    fn registering_a_driver_creates_an_unavailable_profile() {
        let store = Store::new();
        let id = driver(&store, "kamau");

        let profile = driver_profile(&store, id).unwrap();
        assert!(!profile.location.is_available);
        assert!(profile.location.coordinates().is_none());
        assert_eq!(profile.background_check_status, BackgroundCheckStatus::Pending);
    }

    #[test]
    fn riders_get_no_driver_profile() {
        let store = Store::new();
        let rider = register_user(
            &store,
            NewUser {
                username: "wanjiru".to_string(),
                full_name: String::new(),
                phone_number: String::new(),
                is_driver: false,
                license_number: None,
                vehicle: None,
            },
        )
        .unwrap();

        assert!(matches!(
            driver_profile(&store, rider.id),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn duplicate_username_is_a_conflict() {
        let store = Store::new();
        driver(&store, "otieno");
        let second = register_user(
            &store,
            NewUser {
                username: "otieno".to_string(),
                full_name: String::new(),
                phone_number: String::new(),
                is_driver: false,
                license_number: None,
                vehicle: None,
            },
        );
        assert!(matches!(second, Err(AppError::Conflict(_))));
    }

    #[test]
    fn concurrent_registrations_claim_a_username_once() {
        let store = Arc::new(Store::new());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    register_user(
                        &store,
                        NewUser {
                            username: "shared".to_string(),
                            full_name: format!("contender {i}"),
                            phone_number: String::new(),
                            is_driver: i % 2 == 0,
                            license_number: None,
                            vehicle: None,
                        },
                    )
                    .is_ok()
                })
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(store.users.len(), 1);
        assert_eq!(store.usernames.len(), 1);
    }

    #[test]
    fn snapshot_excludes_unavailable_and_unlocated_drivers() {
        let store = Store::new();
        let located = driver(&store, "a");
        let unlocated = driver(&store, "b");
        let offline = driver(&store, "c");

        update_location(&store, located, 1.0, 1.0).unwrap();
        set_availability(&store, located, true).unwrap();
        set_availability(&store, unlocated, true).unwrap();
        update_location(&store, offline, 1.0, 1.0).unwrap();

        let snapshot = available_snapshot(&store);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].driver_id, located);
    }

    #[test]
    fn unknown_driver_location_update_is_swallowed() {
        let store = Store::new();
        assert!(!try_update_location(&store, Uuid::new_v4(), 0.0, 0.0));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let store = Store::new();
        let id = driver(&store, "d");
        assert!(matches!(
            update_location(&store, id, 91.0, 0.0),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            update_location(&store, id, f64::NAN, 0.0),
            Err(AppError::InvalidNumeric(_))
        ));
    }
}
