use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
}

impl Place {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            lat: self.latitude,
            lng: self.longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        use BookingStatus::*;

        matches!(
            (self, next),
            (Pending, Accepted)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Accepted => "Accepted",
            BookingStatus::InProgress => "In Progress",
            BookingStatus::Completed => "Completed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub pickup: Place,
    pub destination: Place,
    pub requested_at: DateTime<Utc>,
    pub scheduled_at: DateTime<Utc>,
    pub status: BookingStatus,
    pub trip_id: Option<Uuid>,
}
