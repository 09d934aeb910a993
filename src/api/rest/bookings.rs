use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::rest::input::{optional_json, optional_number};
use crate::engine::lifecycle::{
    NewBooking, PlaceInput, TripCompletion, accept_booking, cancel_booking, complete_trip,
    create_booking, get_booking, get_trip, start_trip,
};
use crate::error::AppError;
use crate::models::booking::Booking;
use crate::models::payment::PaymentMethod;
use crate::models::trip::Trip;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create))
        .route("/bookings/:id", get(get_one))
        .route("/bookings/:id/accept", post(accept))
        .route("/bookings/:id/start-trip", post(start))
        .route("/bookings/:id/complete-trip", post(complete))
        .route("/bookings/:id/cancel", post(cancel))
        .route("/trips/:id", get(get_trip_by_id))
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    #[serde(default)]
    pub pickup: PlaceRequest,
    #[serde(default)]
    pub destination: PlaceRequest,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Coordinates arrive as numbers or numeric strings.
#[derive(Default, Deserialize)]
pub struct PlaceRequest {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub address: Option<String>,
}

impl PlaceRequest {
    fn into_input(self, kind: &str) -> Result<PlaceInput, AppError> {
        Ok(PlaceInput {
            latitude: optional_number(&format!("{kind}_latitude"), self.latitude.as_ref())?,
            longitude: optional_number(&format!("{kind}_longitude"), self.longitude.as_ref())?,
            address: self.address,
        })
    }
}

#[derive(Default, Deserialize)]
pub struct CompleteTripRequest {
    pub distance: Option<Value>,
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Serialize)]
pub struct CompleteTripResponse {
    pub success: bool,
    pub total_fare: f64,
    #[serde(flatten)]
    pub completion: TripCompletion,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = create_booking(
        &state,
        NewBooking {
            rider_id: payload.rider_id,
            driver_id: payload.driver_id,
            pickup: payload.pickup.into_input("pickup")?,
            destination: payload.destination.into_input("destination")?,
            scheduled_at: payload.scheduled_time,
        },
    )?;

    Ok(Json(booking))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(get_booking(&state, id)?))
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(accept_booking(&state, id)?))
}

async fn start(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(start_trip(&state, id)?))
}

async fn complete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<CompleteTripResponse>, AppError> {
    let payload: CompleteTripRequest = optional_json(&body)?;
    let distance = optional_number("distance", payload.distance.as_ref())?;
    let completion = complete_trip(&state, id, distance, payload.payment_method)?;

    Ok(Json(CompleteTripResponse {
        success: true,
        total_fare: completion.payment.amount,
        completion,
    }))
}

async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(cancel_booking(&state, id)?))
}

async fn get_trip_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    Ok(Json(get_trip(&state, id)?))
}
