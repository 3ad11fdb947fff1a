use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use wereport_application::NotificationRepository;
use wereport_core::{AppError, AppResult};
use wereport_domain::{Notification, NotificationId};

/// In-memory notification repository.
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    notifications: RwLock<HashMap<NotificationId, Notification>>,
}

impl InMemoryNotificationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mut values: Vec<Notification> = notifications
            .values()
            .filter(|notification| notification.user_id == user_id)
            .filter(|notification| !unread_only || !notification.read)
            .cloned()
            .collect();
        values.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        values.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(values)
    }

    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>> {
        Ok(self.notifications.read().await.get(&notification_id).cloned())
    }

    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification> {
        let mut notifications = self.notifications.write().await;
        if notifications.contains_key(&notification.id) {
            return Err(AppError::Conflict(format!(
                "notification '{}' already exists",
                notification.id
            )));
        }

        notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn set_read(
        &self,
        notification_id: NotificationId,
        read: bool,
    ) -> AppResult<Option<Notification>> {
        let mut notifications = self.notifications.write().await;
        Ok(notifications.get_mut(&notification_id).map(|notification| {
            notification.read = read;
            notification.clone()
        }))
    }

    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool> {
        Ok(self
            .notifications
            .write()
            .await
            .remove(&notification_id)
            .is_some())
    }
}
