use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundCheckStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vehicle {
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub color: String,
    pub license_plate: String,
}

/// Current position and availability of a driver. Overwritten in place on
/// every update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverLocation {
    pub driver_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_available: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DriverLocation {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverProfile {
    pub user_id: Uuid,
    pub license_number: String,
    pub vehicle: Vehicle,
    pub background_check_status: BackgroundCheckStatus,
    pub location: DriverLocation,
    pub registered_seq: u64,
}
