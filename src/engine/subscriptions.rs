use chrono::{NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::subscription::{Subscription, SubscriptionPlan};
use crate::store::Store;

pub struct NewSubscription {
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub fn create_subscription(
    store: &Store,
    new_subscription: NewSubscription,
) -> Result<Subscription, AppError> {
    let user_id = new_subscription.user_id;
    if store.user(user_id).is_none() {
        return Err(AppError::NotFound(format!("user {user_id} not found")));
    }
    if new_subscription.end_date < new_subscription.start_date {
        return Err(AppError::Validation(
            "end_date cannot be before start_date".to_string(),
        ));
    }

    let subscription = Subscription {
        id: Uuid::new_v4(),
        user_id,
        plan: new_subscription.plan,
        start_date: new_subscription.start_date,
        end_date: new_subscription.end_date,
        is_active: true,
        created_at: Utc::now(),
    };
    store
        .subscriptions
        .insert(subscription.id, subscription.clone());

    info!(subscription_id = %subscription.id, user_id = %user_id, plan = ?subscription.plan, "subscription created");
    Ok(subscription)
}

/// Newest start date first.
pub fn subscriptions_for_user(store: &Store, user_id: Uuid) -> Vec<Subscription> {
    let mut subscriptions: Vec<Subscription> = store
        .subscriptions
        .iter()
        .filter(|entry| entry.user_id == user_id)
        .map(|entry| entry.value().clone())
        .collect();
    subscriptions.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then(b.created_at.cmp(&a.created_at))
    });
    subscriptions
}

pub fn deactivate_subscription(
    store: &Store,
    subscription_id: Uuid,
) -> Result<Subscription, AppError> {
    let mut subscription = store
        .subscriptions
        .get_mut(&subscription_id)
        .ok_or_else(|| AppError::NotFound(format!("subscription {subscription_id} not found")))?;
    subscription.is_active = false;

    info!(subscription_id = %subscription_id, "subscription deactivated");
    Ok(subscription.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::rider;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn monthly(user_id: Uuid, start: NaiveDate, end: NaiveDate) -> NewSubscription {
        NewSubscription {
            user_id,
            plan: SubscriptionPlan::Premium,
            start_date: start,
            end_date: end,
        }
    }

    #[test]
    fn new_subscription_starts_active() {
        let store = Store::new();
        let user_id = rider(&store, "subscriber");

        let sub = create_subscription(
            &store,
            monthly(user_id, date(2026, 1, 1), date(2026, 1, 31)),
        )
        .unwrap();

        assert!(sub.is_active);
        assert!(sub.covers(date(2026, 1, 31)));
        assert!(!sub.covers(date(2026, 2, 1)));
    }

    #[test]
    fn single_day_subscription_is_allowed() {
        let store = Store::new();
        let user_id = rider(&store, "one-day");

        let day = date(2026, 3, 15);
        assert!(create_subscription(&store, monthly(user_id, day, day)).is_ok());
    }

    #[test]
    fn end_before_start_is_rejected() {
        let store = Store::new();
        let user_id = rider(&store, "backwards");

        let result = create_subscription(
            &store,
            monthly(user_id, date(2026, 2, 1), date(2026, 1, 31)),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(store.subscriptions.is_empty());
    }

    #[test]
    fn unknown_user_cannot_subscribe() {
        let store = Store::new();
        let result = create_subscription(
            &store,
            monthly(Uuid::new_v4(), date(2026, 1, 1), date(2026, 1, 31)),
        );
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn listing_is_per_user_newest_first() {
        let store = Store::new();
        let user_id = rider(&store, "renewer");
        let other = rider(&store, "someone-else");

        create_subscription(&store, monthly(user_id, date(2026, 1, 1), date(2026, 1, 31)))
            .unwrap();
        create_subscription(&store, monthly(user_id, date(2026, 2, 1), date(2026, 2, 28)))
            .unwrap();
        create_subscription(&store, monthly(other, date(2026, 1, 1), date(2026, 1, 31)))
            .unwrap();

        let starts: Vec<NaiveDate> = subscriptions_for_user(&store, user_id)
            .iter()
            .map(|s| s.start_date)
            .collect();
        assert_eq!(starts, vec![date(2026, 2, 1), date(2026, 1, 1)]);
    }

    #[test]
    fn deactivated_subscription_covers_nothing() {
        let store = Store::new();
        let user_id = rider(&store, "lapsed");
        let sub = create_subscription(
            &store,
            monthly(user_id, date(2026, 1, 1), date(2026, 12, 31)),
        )
        .unwrap();

        let sub = deactivate_subscription(&store, sub.id).unwrap();
        assert!(!sub.is_active);
        assert!(!sub.covers(date(2026, 6, 1)));
        assert!(matches!(
            deactivate_subscription(&store, Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }
}
