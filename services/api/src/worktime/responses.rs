use serde::Serialize;

use stechuhr_db::work_rule::models::WorkTimeRule;

#[derive(Debug, Serialize)]
pub struct AutoClockOutResponse {
    /// True when this call actually closed the entry.
    pub clocked_out: bool,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListRulesResponse {
    pub data: Vec<WorkTimeRule>,
    pub count: usize,
}
