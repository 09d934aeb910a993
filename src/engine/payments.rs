use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::payment::{Payment, PaymentStatus};
use crate::state::AppState;

pub fn get_payment(state: &AppState, payment_id: Uuid) -> Result<Payment, AppError> {
    state
        .store
        .payment(payment_id)
        .ok_or_else(|| AppError::NotFound(format!("payment {payment_id} not found")))
}

/// Settles a pending payment. There is no gateway behind this: the
/// transaction id is derived from the settlement time.
pub fn process_payment(state: &AppState, payment_id: Uuid) -> Result<Payment, AppError> {
    let result = process_payment_inner(state, payment_id);
    state.metrics.record_transition("process_payment", result.is_ok());
    result
}

fn process_payment_inner(state: &AppState, payment_id: Uuid) -> Result<Payment, AppError> {
    let processed = {
        let mut payment = state
            .store
            .payments
            .get_mut(&payment_id)
            .ok_or_else(|| AppError::NotFound(format!("payment {payment_id} not found")))?;

        if payment.status != PaymentStatus::Pending {
            return Err(AppError::InvalidTransition(format!(
                "payment {payment_id} is not pending"
            )));
        }

        let now = Utc::now();
        payment.status = PaymentStatus::Completed;
        payment.transaction_id = Some(format!("TX-{}", now.format("%Y%m%d%H%M%S")));
        payment.clone()
    };

    info!(payment_id = %payment_id, amount = processed.amount, "payment processed");

    let booking = state
        .store
        .trip(processed.trip_id)
        .and_then(|trip| state.store.booking(trip.booking_id));

    if let Some(booking) = booking {
        let amount = processed.amount;
        state.notifier.notify(
            booking.rider_id,
            "Payment Successful",
            &format!("Your payment of ${amount:.2} was successful"),
            Some(booking.id),
        );
        state.notifier.notify(
            booking.driver_id,
            "Payment Received",
            &format!(
                "You've received payment of ${amount:.2} for trip #{}",
                processed.trip_id
            ),
            Some(booking.id),
        );
    }

    Ok(processed)
}
