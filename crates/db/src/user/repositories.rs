use async_trait::async_trait;
use uuid::Uuid;

use crate::user::models::User;
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn get_by_name(&self, name: &str) -> AppResult<Option<User>>;

    /// Returns the user iff name and PIN match.
    async fn authenticate(&self, name: &str, pin: &str) -> AppResult<Option<User>>;

    /// Set a PIN on first login. Fails if a PIN is already set.
    async fn set_pin(&self, id: Uuid, pin: &str) -> AppResult<()>;

    async fn list_admins(&self) -> AppResult<Vec<User>>;
}
