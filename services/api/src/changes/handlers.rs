use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use stechuhr_db::change_request::models::{ChangeRequest, ChangeRequestFilter};
use stechuhr_db::change_request::pg_repository::PgChangeRequestRepository;
use stechuhr_db::change_request::repositories::ChangeRequestRepository;
use stechuhr_db::timesheet::pg_repository::PgTimesheetRepository;

use crate::changes::requests::{
    ApproveRequest, CreateRequest, ListQuery, ModifyRequest, RejectRequest,
};
use crate::changes::responses::ListChangeRequestsResponse;
use crate::changes::workflow::{ChangeRequestWorkflow, CreateChangeRequest, ModifyOverrides};
use crate::error::ApiError;
use crate::AppState;

fn workflow(
    state: &AppState,
) -> ChangeRequestWorkflow<PgChangeRequestRepository, PgTimesheetRepository> {
    ChangeRequestWorkflow::new(state.change_repo.clone(), state.timesheet_repo.clone())
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateRequest>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let request = workflow(&state)
        .create(CreateChangeRequest {
            user_id: body.user_id,
            time_entry_id: body.time_entry_id,
            kind: body.kind,
            change_reason: body.change_reason,
        })
        .await?;
    Ok(Json(request))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListChangeRequestsResponse>, ApiError> {
    let data = state
        .change_repo
        .list(ChangeRequestFilter {
            user_id: query.user_id,
            pending_only: query.pending.unwrap_or(false),
        })
        .await?;
    let count = data.len();
    Ok(Json(ListChangeRequestsResponse { data, count }))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ApproveRequest>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let request = workflow(&state)
        .approve(id, body.admin_id, body.comment)
        .await?;
    Ok(Json(request))
}

pub async fn reject(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<RejectRequest>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let request = workflow(&state)
        .reject(id, body.admin_id, body.comment)
        .await?;
    Ok(Json(request))
}

pub async fn modify(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ModifyRequest>,
) -> Result<Json<ChangeRequest>, ApiError> {
    let request = workflow(&state)
        .modify(
            id,
            body.admin_id,
            body.comment,
            ModifyOverrides {
                final_start_time: body.final_start_time,
                final_end_time: body.final_end_time,
                final_reason: body.final_reason,
                final_date: body.final_date,
            },
        )
        .await?;
    Ok(Json(request))
}
