pub mod bookings;
pub mod drivers;
pub mod input;
pub mod notifications;
pub mod payments;
pub mod reviews;
pub mod subscriptions;
pub mod users;
pub mod ws;

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(users::router())
        .merge(drivers::router())
        .merge(bookings::router())
        .merge(payments::router())
        .merge(reviews::router())
        .merge(notifications::router())
        .merge(subscriptions::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/location/:subject_id", get(ws::ws_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    users: usize,
    drivers: usize,
    bookings: usize,
    trips: usize,
    payments: usize,
    location_listeners: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        users: state.store.users.len(),
        drivers: state.store.drivers.len(),
        bookings: state.store.bookings.len(),
        trips: state.store.trips.len(),
        payments: state.store.payments.len(),
        location_listeners: state.location_channel.total_listeners(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
