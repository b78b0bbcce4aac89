use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ClockRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StartBreakRequest {
    pub user_id: Uuid,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct EndBreakRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Default)]
pub struct EntriesQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentQuery {
    pub user_id: Uuid,
}
