use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::notification::Notification;
use crate::store::Store;

/// Receiver of user-facing events. Implementations must not block and must
/// swallow their own delivery failures.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: Uuid, title: &str, message: &str, related_booking_id: Option<Uuid>);
}

/// Appends every event to the notification table.
pub struct StoreNotificationSink {
    store: Arc<Store>,
}

impl StoreNotificationSink {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }
}

impl NotificationSink for StoreNotificationSink {
    fn notify(&self, user_id: Uuid, title: &str, message: &str, related_booking_id: Option<Uuid>) {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            message: message.to_string(),
            related_booking_id,
            is_read: false,
            created_at: Utc::now(),
        };

        info!(
            user_id = %user_id,
            notification_id = %notification.id,
            title,
            "notification stored"
        );
        self.store.notifications.insert(notification.id, notification);
    }
}
