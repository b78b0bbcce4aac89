use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use stechuhr_db::change_request::models::CorrectionKind;

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub user_id: Uuid,
    pub time_entry_id: Uuid,
    #[serde(flatten)]
    pub kind: CorrectionKind,
    pub change_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub admin_id: Uuid,
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub admin_id: Uuid,
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    pub admin_id: Uuid,
    pub comment: Option<String>,
    pub final_start_time: Option<DateTime<Utc>>,
    pub final_end_time: Option<DateTime<Utc>>,
    pub final_reason: Option<String>,
    pub final_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    pub user_id: Option<Uuid>,
    pub pending: Option<bool>,
}
