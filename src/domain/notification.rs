//! In-app notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::new_id;

/// Event that produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// A user applied to become a doctor (sent to admins)
    Application,
    /// Doctor application accepted
    Success,
    /// Doctor application rejected
    Error,
    /// Appointment booked (sent to the doctor)
    Appointment,
    /// Appointment completed (sent to the patient)
    Completed,
    /// Appointment cancelled (sent to the other party)
    Cancelled,
    /// Prescription issued (sent to the patient)
    Prescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id")]
    pub id: String,
    /// Recipient user id
    pub user_id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn new(user_id: impl Into<String>, content: impl Into<String>, kind: NotificationKind) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.into(),
            content: content.into(),
            kind,
            created_at: now,
            updated_at: now,
        }
    }
}
