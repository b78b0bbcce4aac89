use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-employee login/logout window, compared against local wall-clock
/// time-of-day. One rule per non-admin user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkTimeRule {
    pub user_id: Uuid,
    pub earliest_login_time: NaiveTime,
    pub latest_logout_time: NaiveTime,
    pub is_active: bool,
}

/// Partial update; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleUpdate {
    pub earliest_login_time: Option<NaiveTime>,
    pub latest_logout_time: Option<NaiveTime>,
    pub is_active: Option<bool>,
}
