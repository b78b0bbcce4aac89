use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;

use stechuhr_common::error::AppError;
use stechuhr_db::timesheet::models::{Break, TimeEntry};
use stechuhr_db::timesheet::repositories::TimesheetRepository;

use crate::error::ApiError;
use crate::timesheet::requests::{
    ClockRequest, CurrentQuery, EndBreakRequest, EntriesQuery, StartBreakRequest,
};
use crate::timesheet::responses::{CurrentEntryResponse, ListEntriesResponse};
use crate::AppState;

pub async fn clock_in(
    State(state): State<AppState>,
    Json(body): Json<ClockRequest>,
) -> Result<Json<TimeEntry>, ApiError> {
    let entry = state.timesheet_repo.clock_in(body.user_id, Utc::now()).await?;
    tracing::info!(user_id = %body.user_id, entry_id = %entry.id, "clock-in");
    Ok(Json(entry))
}

pub async fn clock_out(
    State(state): State<AppState>,
    Json(body): Json<ClockRequest>,
) -> Result<Json<TimeEntry>, ApiError> {
    let entry = state.timesheet_repo.clock_out(body.user_id, Utc::now()).await?;
    tracing::info!(user_id = %body.user_id, entry_id = %entry.id, "clock-out");
    Ok(Json(entry))
}

pub async fn start_break(
    State(state): State<AppState>,
    Json(body): Json<StartBreakRequest>,
) -> Result<Json<Break>, ApiError> {
    let entry = state
        .timesheet_repo
        .find_open_entry(body.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation("cannot start a break without being clocked in".to_string())
        })?;

    let brk = state
        .timesheet_repo
        .start_break(entry.id, &body.reason, Utc::now())
        .await?;
    Ok(Json(brk))
}

pub async fn end_break(
    State(state): State<AppState>,
    Json(body): Json<EndBreakRequest>,
) -> Result<Json<Break>, ApiError> {
    let entry = state
        .timesheet_repo
        .find_open_entry(body.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Validation("cannot end a break without being clocked in".to_string())
        })?;

    let brk = state.timesheet_repo.end_break(entry.id, Utc::now()).await?;
    Ok(Json(brk))
}

pub async fn list_entries(
    State(state): State<AppState>,
    Query(query): Query<EntriesQuery>,
) -> Result<Json<ListEntriesResponse>, ApiError> {
    let data = state.timesheet_repo.list_entries(query.user_id).await?;
    let count = data.len();
    Ok(Json(ListEntriesResponse { data, count }))
}

pub async fn current_entry(
    State(state): State<AppState>,
    Query(query): Query<CurrentQuery>,
) -> Result<Json<CurrentEntryResponse>, ApiError> {
    let entry = state.timesheet_repo.find_open_entry(query.user_id).await?;
    Ok(Json(CurrentEntryResponse { entry }))
}
