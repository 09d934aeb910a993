use std::sync::Arc;

use uuid::Uuid;

use crate::config::Config;
use crate::engine::drivers::{NewUser, register_user, set_availability, update_location};
use crate::notify::testing::RecordingSink;
use crate::state::AppState;
use crate::store::Store;

pub fn driver(store: &Store, username: &str) -> Uuid {
    register(store, username, true)
}

pub fn rider(store: &Store, username: &str) -> Uuid {
    register(store, username, false)
}

pub fn available_driver_at(store: &Store, username: &str, lat: f64, lng: f64) -> Uuid {
    let id = driver(store, username);
    update_location(store, id, lat, lng).unwrap();
    set_availability(store, id, true).unwrap();
    id
}

pub fn recording_state() -> (AppState, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let state = AppState::with_notifier(&Config::default(), Arc::new(Store::new()), sink.clone());
    (state, sink)
}

fn register(store: &Store, username: &str, is_driver: bool) -> Uuid {
    register_user(
        store,
        NewUser {
            username: username.to_string(),
            full_name: format!("{username} test"),
            phone_number: "0700000000".to_string(),
            is_driver,
            license_number: is_driver.then(|| "DL-1".to_string()),
            vehicle: None,
        },
    )
    .unwrap()
    .id
}
