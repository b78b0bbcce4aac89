use axum::extract::{Query, State};
use axum::Json;

use stechuhr_common::error::AppError;
use stechuhr_db::activity::models::{ActivityFilter, SourceSystem};
use stechuhr_db::activity::repositories::ActivityRepository;
use stechuhr_db::sync_state::repositories::SyncStatusRepository;

use crate::activities::requests::ActivitiesQuery;
use crate::activities::responses::{ListActivitiesResponse, SyncResponse, SyncStatusResponse};
use crate::error::ApiError;
use crate::AppState;

pub async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ActivitiesQuery>,
) -> Result<Json<ListActivitiesResponse>, ApiError> {
    let source = query
        .source
        .as_deref()
        .map(|s| s.parse::<SourceSystem>())
        .transpose()
        .map_err(AppError::Validation)?;

    let data = state
        .activity_repo
        .list(ActivityFilter {
            source,
            limit: query.limit,
        })
        .await?;
    let count = data.len();
    Ok(Json(ListActivitiesResponse { data, count }))
}

pub async fn sync_status(
    State(state): State<AppState>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let data = state.sync_status_repo.list().await?;
    Ok(Json(SyncStatusResponse { data }))
}

/// Run a full sync across all sources. Always answers 200; per-source
/// failures are reported inside the body rather than as an HTTP error.
pub async fn run_sync(State(state): State<AppState>) -> Json<SyncResponse> {
    let report = state.orchestrator.run_sync().await;

    let message = format!("synced {} activities", report.total_count());
    Json(SyncResponse {
        success: report.all_succeeded(),
        message,
        results: report.sources,
    })
}
