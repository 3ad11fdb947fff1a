//! User notification ports and application service.

use std::sync::Arc;

use async_trait::async_trait;

use wereport_core::{AppError, AppResult, Principal};
use wereport_domain::{
    NewNotification, NewNotificationInput, Notification, NotificationId, NotificationUpdateInput,
};

use crate::{Clock, OperationClass, RateLimitService, Throttled};

/// Notifications returned by one listing.
pub const NOTIFICATION_LIST_LIMIT: u32 = 50;

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Repository port for notifications.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Lists a user's notifications, newest first.
    async fn list_notifications(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> AppResult<Vec<Notification>>;

    /// Finds one notification.
    async fn find_notification(
        &self,
        notification_id: NotificationId,
    ) -> AppResult<Option<Notification>>;

    /// Inserts a notification.
    async fn insert_notification(&self, notification: Notification) -> AppResult<Notification>;

    /// Sets the read flag. Returns `None` when the notification is gone.
    async fn set_read(
        &self,
        notification_id: NotificationId,
        read: bool,
    ) -> AppResult<Option<Notification>>;

    /// Deletes a notification and reports whether a row was removed.
    async fn delete_notification(&self, notification_id: NotificationId) -> AppResult<bool>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Application service for user notifications.
#[derive(Clone)]
pub struct NotificationService {
    repository: Arc<dyn NotificationRepository>,
    rate_limits: RateLimitService,
    clock: Arc<dyn Clock>,
}

impl NotificationService {
    /// Creates a new notification service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn NotificationRepository>,
        rate_limits: RateLimitService,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            rate_limits,
            clock,
        }
    }

    /// Lists notifications for `user_id`, defaulting to the actor.
    ///
    /// Only administrators may read another user's notifications.
    pub async fn list_notifications(
        &self,
        actor: &Principal,
        user_id: Option<&str>,
        unread_only: bool,
    ) -> AppResult<Vec<Notification>> {
        let target = user_id
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(actor.subject());
        if target != actor.subject() && !actor.is_admin() {
            return Err(AppError::Forbidden(
                "you can only view your own notifications".to_owned(),
            ));
        }

        self.repository
            .list_notifications(target, unread_only, NOTIFICATION_LIST_LIMIT)
            .await
    }

    /// Sends a notification. Only administrators may do this.
    pub async fn create_notification(
        &self,
        actor: &Principal,
        input: NewNotificationInput,
    ) -> AppResult<Throttled<Notification>> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "only administrators can create notifications".to_owned(),
            ));
        }

        let quota = self
            .rate_limits
            .enforce(OperationClass::Notification, actor.subject())
            .await?;

        let new = NewNotification::new(input)?;
        let notification = Notification::create(NotificationId::new(), new, self.clock.now());
        let stored = self.repository.insert_notification(notification).await?;

        Ok(Throttled {
            value: stored,
            quota,
        })
    }

    /// Marks a notification read or unread.
    ///
    /// An edit without a read flag returns the notification unchanged.
    pub async fn update_notification(
        &self,
        actor: &Principal,
        notification_id: NotificationId,
        input: NotificationUpdateInput,
    ) -> AppResult<Throttled<Notification>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Notification, actor.subject())
            .await?;

        let existing = self.owned_notification(actor, notification_id, "update").await?;
        let notification = match input.read {
            Some(read) => self
                .repository
                .set_read(notification_id, read)
                .await?
                .ok_or_else(|| not_found(notification_id))?,
            None => existing,
        };

        Ok(Throttled {
            value: notification,
            quota,
        })
    }

    /// Deletes a notification.
    pub async fn delete_notification(
        &self,
        actor: &Principal,
        notification_id: NotificationId,
    ) -> AppResult<Throttled<()>> {
        let quota = self
            .rate_limits
            .enforce(OperationClass::Notification, actor.subject())
            .await?;

        self.owned_notification(actor, notification_id, "delete")
            .await?;
        if !self
            .repository
            .delete_notification(notification_id)
            .await?
        {
            return Err(not_found(notification_id));
        }

        Ok(Throttled { value: (), quota })
    }

    async fn owned_notification(
        &self,
        actor: &Principal,
        notification_id: NotificationId,
        action: &str,
    ) -> AppResult<Notification> {
        let notification = self
            .repository
            .find_notification(notification_id)
            .await?
            .ok_or_else(|| not_found(notification_id))?;

        if notification.user_id != actor.subject() && !actor.is_admin() {
            return Err(AppError::Forbidden(format!(
                "you can only {action} your own notifications"
            )));
        }

        Ok(notification)
    }
}

fn not_found(notification_id: NotificationId) -> AppError {
    AppError::NotFound(format!(
        "notification '{notification_id}' does not exist"
    ))
}
