use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AutoClockOutCheckRequest {
    pub user_id: Uuid,
}
