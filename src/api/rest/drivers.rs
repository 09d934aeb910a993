use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::api::rest::input::optional_number;
use crate::engine::dispatch::{SearchVariant, find_nearby, parse_search};
use crate::engine::drivers::{driver_profile, list_drivers, set_availability, update_location};
use crate::engine::fare::round_cents;
use crate::error::AppError;
use crate::models::driver::{DriverLocation, DriverProfile};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/drivers", get(list))
        .route("/drivers/nearby", get(nearby))
        .route("/drivers/radius-search", get(radius_search))
        .route("/drivers/:id", get(get_driver))
        .route("/drivers/:id/location", post(update_driver_location))
        .route("/drivers/:id/availability", patch(update_availability))
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub radius: Option<String>,
    pub limit: Option<String>,
}

#[derive(Serialize)]
pub struct NearbyDriverResponse {
    #[serde(flatten)]
    pub driver: DriverLocation,
    pub distance: f64,
}

#[derive(Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

#[derive(Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub is_available: bool,
}

async fn list(State(state): State<Arc<AppState>>) -> Json<Vec<DriverProfile>> {
    Json(list_drivers(&state.store))
}

async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<DriverProfile>, AppError> {
    Ok(Json(driver_profile(&state.store, id)?))
}

async fn nearby(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<NearbyDriverResponse>>, AppError> {
    search(&state, query, SearchVariant::Nearby)
}

async fn radius_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<NearbyDriverResponse>>, AppError> {
    search(&state, query, SearchVariant::RadiusSearch)
}

fn search(
    state: &AppState,
    query: SearchQuery,
    variant: SearchVariant,
) -> Result<Json<Vec<NearbyDriverResponse>>, AppError> {
    let start = Instant::now();
    let params = parse_search(
        query.latitude.as_deref(),
        query.longitude.as_deref(),
        query.radius.as_deref(),
        query.limit.as_deref(),
        variant,
        state.search,
    )?;

    let found = find_nearby(&state.store, params)?;
    state
        .metrics
        .dispatch_search_latency_seconds
        .with_label_values(&[variant.as_str()])
        .observe(start.elapsed().as_secs_f64());

    let response = found
        .into_iter()
        .map(|candidate| NearbyDriverResponse {
            driver: candidate.driver,
            distance: round_cents(candidate.distance_km),
        })
        .collect();

    Ok(Json(response))
}

async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<Json<DriverLocation>, AppError> {
    let latitude = optional_number("latitude", payload.latitude.as_ref())?;
    let longitude = optional_number("longitude", payload.longitude.as_ref())?;
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(AppError::MissingCoordinates);
    };

    Ok(Json(update_location(&state.store, id, latitude, longitude)?))
}

async fn update_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAvailabilityRequest>,
) -> Result<Json<DriverLocation>, AppError> {
    Ok(Json(set_availability(&state.store, id, payload.is_available)?))
}
