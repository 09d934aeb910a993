use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub trip_id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}
