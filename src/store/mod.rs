use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::models::driver::DriverProfile;
use crate::models::notification::Notification;
use crate::models::payment::Payment;
use crate::models::review::Review;
use crate::models::subscription::Subscription;
use crate::models::trip::Trip;
use crate::models::user::User;

/// In-memory record tables. Each entry guard serializes mutations of one
/// record; tables are locked in the order bookings, trips, payments and a
/// booking guard is never taken while a trip or payment guard is held.
#[derive(Default)]
pub struct Store {
    pub users: DashMap<Uuid, User>,
    pub usernames: DashMap<String, Uuid>,
    pub drivers: DashMap<Uuid, DriverProfile>,
    pub bookings: DashMap<Uuid, Booking>,
    pub trips: DashMap<Uuid, Trip>,
    pub payments: DashMap<Uuid, Payment>,
    pub reviews: DashMap<Uuid, Review>,
    pub reviews_by_trip: DashMap<Uuid, Uuid>,
    pub notifications: DashMap<Uuid, Notification>,
    pub subscriptions: DashMap<Uuid, Subscription>,
    driver_seq: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_driver_seq(&self) -> u64 {
        self.driver_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.get(&id).map(|entry| entry.value().clone())
    }

    pub fn booking(&self, id: Uuid) -> Option<Booking> {
        self.bookings.get(&id).map(|entry| entry.value().clone())
    }

    pub fn trip(&self, id: Uuid) -> Option<Trip> {
        self.trips.get(&id).map(|entry| entry.value().clone())
    }

    pub fn payment(&self, id: Uuid) -> Option<Payment> {
        self.payments.get(&id).map(|entry| entry.value().clone())
    }
}
