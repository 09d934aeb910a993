use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::drivers::validate_coordinates;
use crate::error::AppError;
use crate::geo::haversine_km;
use crate::models::booking::{Booking, BookingStatus, Place};
use crate::models::payment::{Payment, PaymentMethod, PaymentStatus};
use crate::models::trip::Trip;
use crate::state::AppState;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceInput {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub pickup: PlaceInput,
    pub destination: PlaceInput,
    pub scheduled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TripCompletion {
    pub booking: Booking,
    pub trip: Trip,
    pub payment: Payment,
}

/// Message produced while a booking guard is held and delivered after it is
/// released.
struct Notice {
    user_id: Uuid,
    title: String,
    message: String,
    booking_id: Uuid,
}

impl Notice {
    fn send(self, state: &AppState) {
        state
            .notifier
            .notify(self.user_id, &self.title, &self.message, Some(self.booking_id));
    }
}

pub fn transition(current: BookingStatus, next: BookingStatus) -> Result<(), AppError> {
    if current.can_transition_to(next) {
        Ok(())
    } else if current.is_terminal() {
        Err(AppError::InvalidTransition(format!(
            "booking is already {}",
            current.as_str()
        )))
    } else {
        Err(AppError::InvalidTransition(format!(
            "booking cannot move from {} to {}",
            current.as_str(),
            next.as_str()
        )))
    }
}

pub fn create_booking(state: &AppState, new_booking: NewBooking) -> Result<Booking, AppError> {
    let result = create_booking_inner(state, new_booking);
    state.metrics.record_transition("create", result.is_ok());
    result
}

fn create_booking_inner(state: &AppState, new_booking: NewBooking) -> Result<Booking, AppError> {
    let pickup = required_place("pickup", new_booking.pickup)?;
    let destination = required_place("destination", new_booking.destination)?;
    let scheduled_at = new_booking
        .scheduled_at
        .ok_or_else(|| AppError::Validation("scheduled_time is required".to_string()))?;

    let rider = state
        .store
        .user(new_booking.rider_id)
        .ok_or_else(|| AppError::NotFound(format!("rider {} not found", new_booking.rider_id)))?;
    if !state.store.drivers.contains_key(&new_booking.driver_id) {
        return Err(AppError::NotFound(format!(
            "driver profile {} not found",
            new_booking.driver_id
        )));
    }
    if rider.id == new_booking.driver_id {
        return Err(AppError::Validation(
            "rider and driver must be different users".to_string(),
        ));
    }

    let booking = Booking {
        id: Uuid::new_v4(),
        rider_id: rider.id,
        driver_id: new_booking.driver_id,
        pickup,
        destination,
        requested_at: Utc::now(),
        scheduled_at,
        status: BookingStatus::Pending,
        trip_id: None,
    };

    state.store.bookings.insert(booking.id, booking.clone());
    info!(booking_id = %booking.id, rider_id = %booking.rider_id, driver_id = %booking.driver_id, "booking created");

    Notice {
        user_id: booking.driver_id,
        title: "New Booking Request".to_string(),
        message: format!(
            "You have a new booking request from {}",
            rider.display_name()
        ),
        booking_id: booking.id,
    }
    .send(state);

    Ok(booking)
}

pub fn accept_booking(state: &AppState, booking_id: Uuid) -> Result<Booking, AppError> {
    let result = change_status(state, booking_id, BookingStatus::Accepted, |booking| {
        let driver_name = state
            .store
            .user(booking.driver_id)
            .map(|driver| driver.display_name().to_string())
            .unwrap_or_else(|| "your driver".to_string());
        format!("Your booking has been accepted by {driver_name}")
    });
    state.metrics.record_transition("accept", result.is_ok());
    result
}

pub fn cancel_booking(state: &AppState, booking_id: Uuid) -> Result<Booking, AppError> {
    let result = change_status(state, booking_id, BookingStatus::Cancelled, |_| {
        "Your booking has been cancelled".to_string()
    });
    state.metrics.record_transition("cancel", result.is_ok());
    result
}

fn change_status(
    state: &AppState,
    booking_id: Uuid,
    next: BookingStatus,
    message: impl FnOnce(&Booking) -> String,
) -> Result<Booking, AppError> {
    let updated = {
        let mut booking = state
            .store
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| booking_not_found(booking_id))?;

        transition(booking.status, next)?;
        booking.status = next;
        booking.clone()
    };

    info!(booking_id = %booking_id, status = next.as_str(), "booking status changed");

    Notice {
        user_id: updated.rider_id,
        title: format!("Booking {}", next.label()),
        message: message(&updated),
        booking_id,
    }
    .send(state);

    Ok(updated)
}

/// Moves an accepted booking into progress and opens its trip. Repeating the
/// call once the trip is running returns the existing trip untouched.
pub fn start_trip(state: &AppState, booking_id: Uuid) -> Result<Trip, AppError> {
    let result = start_trip_inner(state, booking_id);
    state.metrics.record_transition("start_trip", result.is_ok());
    result
}

fn start_trip_inner(state: &AppState, booking_id: Uuid) -> Result<Trip, AppError> {
    let (trip, notice) = {
        let mut booking = state
            .store
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| booking_not_found(booking_id))?;

        if booking.status == BookingStatus::InProgress {
            if let Some(trip) = booking.trip_id.and_then(|id| state.store.trip(id)) {
                info!(booking_id = %booking_id, trip_id = %trip.id, "trip already started");
                return Ok(trip);
            }
        }

        transition(booking.status, BookingStatus::InProgress)?;

        let trip = match booking.trip_id.and_then(|id| state.store.trip(id)) {
            Some(existing) => existing,
            None => {
                let trip = Trip {
                    id: Uuid::new_v4(),
                    booking_id,
                    start_time: Some(Utc::now()),
                    end_time: None,
                    distance_km: None,
                    total_fare: None,
                    payment_id: None,
                };
                state.store.trips.insert(trip.id, trip.clone());
                trip
            }
        };

        booking.trip_id = Some(trip.id);
        booking.status = BookingStatus::InProgress;

        let notice = Notice {
            user_id: booking.rider_id,
            title: "Trip Started".to_string(),
            message: format!(
                "Your trip has started. Booking status: {}",
                BookingStatus::InProgress.label()
            ),
            booking_id,
        };
        (trip, notice)
    };

    info!(booking_id = %booking_id, trip_id = %trip.id, "trip started");
    notice.send(state);

    Ok(trip)
}

/// Closes the running trip, prices it and opens a pending payment. Without a
/// distance override the straight-line pickup to destination distance is
/// billed.
pub fn complete_trip(
    state: &AppState,
    booking_id: Uuid,
    distance_km: Option<f64>,
    payment_method: Option<PaymentMethod>,
) -> Result<TripCompletion, AppError> {
    let result = complete_trip_inner(state, booking_id, distance_km, payment_method);
    state.metrics.record_transition("complete_trip", result.is_ok());
    result
}

fn complete_trip_inner(
    state: &AppState,
    booking_id: Uuid,
    distance_km: Option<f64>,
    payment_method: Option<PaymentMethod>,
) -> Result<TripCompletion, AppError> {
    if let Some(distance) = distance_km {
        if !distance.is_finite() {
            return Err(AppError::InvalidNumeric("distance".to_string()));
        }
        if distance < 0.0 {
            return Err(AppError::Validation("distance cannot be negative".to_string()));
        }
    }

    let completion = {
        let mut booking = state
            .store
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| booking_not_found(booking_id))?;

        transition(booking.status, BookingStatus::Completed)?;

        let trip_not_found = || AppError::NotFound(format!("trip for booking {booking_id} not found"));
        let trip_id = booking.trip_id.ok_or_else(trip_not_found)?;
        let mut trip = state.store.trips.get_mut(&trip_id).ok_or_else(trip_not_found)?;
        let start_time = trip.start_time.ok_or_else(trip_not_found)?;

        let end_time = Utc::now();
        let duration_hours =
            ((end_time - start_time).num_milliseconds().max(0) as f64) / 3_600_000.0;
        let distance = distance_km
            .unwrap_or_else(|| haversine_km(&booking.pickup.point(), &booking.destination.point()));
        let total_fare = state.fares.fare(distance, duration_hours);

        let payment = Payment {
            id: Uuid::new_v4(),
            trip_id,
            amount: total_fare,
            method: payment_method.unwrap_or_default(),
            transaction_id: None,
            status: PaymentStatus::Pending,
            created_at: end_time,
        };

        trip.end_time = Some(end_time);
        trip.distance_km = Some(distance);
        trip.total_fare = Some(total_fare);
        trip.payment_id = Some(payment.id);
        state.store.payments.insert(payment.id, payment.clone());
        booking.status = BookingStatus::Completed;

        TripCompletion {
            booking: booking.clone(),
            trip: trip.clone(),
            payment,
        }
    };

    let fare = completion.payment.amount;
    info!(
        booking_id = %booking_id,
        trip_id = %completion.trip.id,
        payment_id = %completion.payment.id,
        fare,
        "trip completed"
    );

    Notice {
        user_id: completion.booking.rider_id,
        title: "Trip Completed".to_string(),
        message: format!("Your trip has been completed. Total fare: ${fare:.2}"),
        booking_id,
    }
    .send(state);

    Ok(completion)
}

pub fn get_booking(state: &AppState, booking_id: Uuid) -> Result<Booking, AppError> {
    state
        .store
        .booking(booking_id)
        .ok_or_else(|| booking_not_found(booking_id))
}

pub fn get_trip(state: &AppState, trip_id: Uuid) -> Result<Trip, AppError> {
    state
        .store
        .trip(trip_id)
        .ok_or_else(|| AppError::NotFound(format!("trip {trip_id} not found")))
}

/// Bookings where the user is either the rider or the driver, newest first.
pub fn bookings_for_user(state: &AppState, user_id: Uuid) -> Vec<Booking> {
    let mut bookings: Vec<Booking> = state
        .store
        .bookings
        .iter()
        .filter(|entry| entry.rider_id == user_id || entry.driver_id == user_id)
        .map(|entry| entry.value().clone())
        .collect();
    bookings.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
    bookings
}

fn booking_not_found(booking_id: Uuid) -> AppError {
    warn!(booking_id = %booking_id, "booking lookup failed");
    AppError::NotFound(format!("booking {booking_id} not found"))
}

fn required_place(kind: &str, input: PlaceInput) -> Result<Place, AppError> {
    let (Some(latitude), Some(longitude)) = (input.latitude, input.longitude) else {
        return Err(AppError::Validation(format!(
            "{kind} latitude and longitude are required"
        )));
    };
    validate_coordinates(latitude, longitude)?;

    let address = input
        .address
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{kind} address is required")))?;

    Ok(Place {
        latitude,
        longitude,
        address,
    })
}
