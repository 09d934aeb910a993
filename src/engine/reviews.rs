use chrono::Utc;
use dashmap::mapref::entry::Entry;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::booking::BookingStatus;
use crate::models::review::Review;
use crate::state::AppState;

pub struct NewReview {
    pub trip_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
}

/// Rider's rating of a finished trip. One review per trip.
pub fn create_review(state: &AppState, new_review: NewReview) -> Result<Review, AppError> {
    if !(1..=5).contains(&new_review.rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    let trip = state
        .store
        .trip(new_review.trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {} not found", new_review.trip_id)))?;
    let booking = state
        .store
        .booking(trip.booking_id)
        .ok_or_else(|| AppError::NotFound(format!("booking {} not found", trip.booking_id)))?;

    if booking.status != BookingStatus::Completed {
        return Err(AppError::Validation(
            "only completed trips can be reviewed".to_string(),
        ));
    }

    let review = Review {
        id: Uuid::new_v4(),
        trip_id: trip.id,
        rider_id: booking.rider_id,
        driver_id: booking.driver_id,
        rating: new_review.rating,
        comment: new_review
            .comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty()),
        created_at: Utc::now(),
    };

    match state.store.reviews_by_trip.entry(trip.id) {
        Entry::Occupied(_) => {
            return Err(AppError::Conflict(format!(
                "trip {} has already been reviewed",
                trip.id
            )));
        }
        Entry::Vacant(slot) => {
            slot.insert(review.id);
        }
    }
    state.store.reviews.insert(review.id, review.clone());

    info!(review_id = %review.id, trip_id = %trip.id, rating = review.rating, "review created");
    state.notifier.notify(
        review.driver_id,
        "New Review",
        &format!("You've received a {}-star review", review.rating),
        Some(booking.id),
    );

    Ok(review)
}

pub fn reviews_for_driver(state: &AppState, driver_id: Uuid) -> Vec<Review> {
    let mut reviews: Vec<Review> = state
        .store
        .reviews
        .iter()
        .filter(|entry| entry.driver_id == driver_id)
        .map(|entry| entry.value().clone())
        .collect();
    reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    reviews
}
