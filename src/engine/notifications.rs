use uuid::Uuid;

use crate::error::AppError;
use crate::models::notification::Notification;
use crate::store::Store;

pub fn list_for_user(store: &Store, user_id: Uuid) -> Vec<Notification> {
    let mut notifications: Vec<Notification> = store
        .notifications
        .iter()
        .filter(|entry| entry.user_id == user_id)
        .map(|entry| entry.value().clone())
        .collect();
    notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notifications
}

pub fn mark_as_read(store: &Store, notification_id: Uuid) -> Result<Notification, AppError> {
    let mut notification = store.notifications.get_mut(&notification_id).ok_or_else(|| {
        AppError::NotFound(format!("notification {notification_id} not found"))
    })?;

    notification.is_read = true;
    Ok(notification.clone())
}

/// Returns how many notifications flipped from unread to read.
pub fn mark_all_as_read(store: &Store, user_id: Uuid) -> usize {
    let mut changed = 0;
    for mut entry in store.notifications.iter_mut() {
        if entry.user_id == user_id && !entry.is_read {
            entry.is_read = true;
            changed += 1;
        }
    }
    changed
}
