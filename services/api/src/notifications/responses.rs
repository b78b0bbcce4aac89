use serde::Serialize;

use stechuhr_db::notification::models::Notification;

#[derive(Debug, Serialize)]
pub struct ListNotificationsResponse {
    pub data: Vec<Notification>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub ok: bool,
}
