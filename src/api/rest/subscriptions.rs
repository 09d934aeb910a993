use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::subscriptions::{
    NewSubscription, create_subscription, deactivate_subscription, subscriptions_for_user,
};
use crate::error::AppError;
use crate::models::subscription::{Subscription, SubscriptionPlan};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/:id/subscriptions", get(list_for_user).post(create))
        .route("/subscriptions/:id/deactivate", post(deactivate))
}

#[derive(Deserialize)]
pub struct CreateSubscriptionRequest {
    pub plan: SubscriptionPlan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

async fn create(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateSubscriptionRequest>,
) -> Result<Json<Subscription>, AppError> {
    let subscription = create_subscription(
        &state.store,
        NewSubscription {
            user_id: id,
            plan: payload.plan,
            start_date: payload.start_date,
            end_date: payload.end_date,
        },
    )?;

    Ok(Json(subscription))
}

async fn list_for_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Json<Vec<Subscription>> {
    Json(subscriptions_for_user(&state.store, id))
}

async fn deactivate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Subscription>, AppError> {
    Ok(Json(deactivate_subscription(&state.store, id)?))
}
