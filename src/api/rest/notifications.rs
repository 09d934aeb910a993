use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Serialize;
use uuid::Uuid;

use crate::engine::notifications::{list_for_user, mark_all_as_read, mark_as_read};
use crate::error::AppError;
use crate::models::notification::Notification;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/:id/notifications", get(list))
        .route(
            "/users/:id/notifications/mark-all-as-read",
            post(mark_all),
        )
        .route("/notifications/:id/mark-as-read", post(mark_one))
}

#[derive(Serialize)]
pub struct MarkAllResponse {
    pub success: bool,
    pub updated: usize,
}

async fn list(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Json<Vec<Notification>> {
    Json(list_for_user(&state.store, user_id))
}

async fn mark_one(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(mark_as_read(&state.store, id)?))
}

async fn mark_all(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Json<MarkAllResponse> {
    Json(MarkAllResponse {
        success: true,
        updated: mark_all_as_read(&state.store, user_id),
    })
}
