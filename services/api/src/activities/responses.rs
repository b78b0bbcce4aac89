use serde::Serialize;

use stechuhr_db::activity::models::UnifiedActivity;
use stechuhr_db::sync_state::models::SyncStatus;
use stechuhr_sync::SourceOutcome;

#[derive(Debug, Serialize)]
pub struct ListActivitiesResponse {
    pub data: Vec<UnifiedActivity>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub data: Vec<SyncStatus>,
}

#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub success: bool,
    pub message: String,
    pub results: Vec<SourceOutcome>,
}
