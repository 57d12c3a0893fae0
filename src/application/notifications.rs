//! Notification service: plain inbox appends, no delivery queue.

use std::sync::Arc;

use crate::domain::{Notification, NotificationKind, User};
use crate::ports::NotificationRepository;
use crate::Result;

pub(crate) const INBOX_LIMIT: usize = 100;

/// Appends and reads per-user notifications.
#[derive(Clone)]
pub struct NotificationService {
    notifications: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(notifications: Arc<dyn NotificationRepository>) -> Self {
        Self { notifications }
    }

    /// Append one notification to `user_id`'s inbox.
    ///
    /// # Errors
    /// Returns error if the insert fails.
    pub fn notify(&self, user_id: &str, content: impl Into<String>, kind: NotificationKind) -> Result<()> {
        let notification = Notification::new(user_id, content, kind);
        self.notifications.insert(&notification)?;
        tracing::debug!("Stored {:?} notification for {}", kind, user_id);
        Ok(())
    }

    /// One notification per recipient, inserted one at a time. A failure
    /// stops the fan-out; earlier inserts stay.
    ///
    /// # Errors
    /// Returns the first insert failure.
    pub fn notify_all(&self, recipients: &[User], content: &str, kind: NotificationKind) -> Result<()> {
        for recipient in recipients {
            self.notify(recipient.id(), content, kind)?;
        }
        Ok(())
    }

    /// Newest first, up to 100.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn list(&self, user_id: &str) -> Result<Vec<Notification>> {
        Ok(self.notifications.for_user(user_id, INBOX_LIMIT)?)
    }

    /// Delete every notification addressed to `user_id`.
    ///
    /// # Errors
    /// Returns error if the delete fails.
    pub fn clear(&self, user_id: &str) -> Result<usize> {
        let removed = self.notifications.delete_for_user(user_id)?;
        tracing::info!("Cleared {} notification(s) for {}", removed, user_id);
        Ok(removed)
    }
}
