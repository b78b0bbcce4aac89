use async_trait::async_trait;
use uuid::Uuid;

use crate::notification::models::{NewNotification, Notification};
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification>;

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>>;

    async fn mark_read(&self, id: Uuid) -> AppResult<()>;
}
