use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub user_id: Uuid,
}
