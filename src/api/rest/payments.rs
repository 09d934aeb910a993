use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use uuid::Uuid;

use crate::engine::payments::{get_payment, process_payment};
use crate::error::AppError;
use crate::models::payment::Payment;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/payments/:id", get(get_one))
        .route("/payments/:id/process-payment", post(process))
}

async fn get_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(get_payment(&state, id)?))
}

async fn process(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Payment>, AppError> {
    Ok(Json(process_payment(&state, id)?))
}
