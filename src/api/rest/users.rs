use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::drivers::{NewUser, register_user};
use crate::engine::lifecycle::bookings_for_user;
use crate::error::AppError;
use crate::models::booking::Booking;
use crate::models::driver::Vehicle;
use crate::models::user::User;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", post(register))
        .route("/users/:id", get(get_user))
        .route("/users/:id/bookings", get(list_bookings))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub is_driver: bool,
    pub license_number: Option<String>,
    pub vehicle: Option<Vehicle>,
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<User>, AppError> {
    let user = register_user(
        &state.store,
        NewUser {
            username: payload.username,
            full_name: payload.full_name,
            phone_number: payload.phone_number,
            is_driver: payload.is_driver,
            license_number: payload.license_number,
            vehicle: payload.vehicle,
        },
    )?;

    Ok(Json(user))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .user(id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    Ok(Json(user))
}

async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Booking>> {
    Json(bookings_for_user(&state, id))
}
