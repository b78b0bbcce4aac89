use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    pub message: String,
    /// Machine-readable category, e.g. `auto_clock_out`.
    pub kind: String,
    /// The employee the notification is about, if any.
    pub related_user_id: Option<Uuid>,
    pub related_user_name: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub message: String,
    pub kind: String,
    pub related_user_id: Option<Uuid>,
    pub related_user_name: Option<String>,
}
