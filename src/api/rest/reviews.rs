use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::reviews::{NewReview, create_review, reviews_for_driver};
use crate::error::AppError;
use crate::models::review::Review;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reviews", post(create))
        .route("/drivers/:id/reviews", get(list_for_driver))
}

#[derive(Deserialize)]
pub struct CreateReviewRequest {
    pub trip_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<Review>, AppError> {
    let review = create_review(
        &state,
        NewReview {
            trip_id: payload.trip_id,
            rating: payload.rating,
            comment: payload.comment,
        },
    )?;

    Ok(Json(review))
}

async fn list_for_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Review>> {
    Json(reviews_for_driver(&state, id))
}
