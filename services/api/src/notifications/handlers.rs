use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use stechuhr_db::notification::repositories::NotificationRepository;

use crate::error::ApiError;
use crate::notifications::requests::NotificationsQuery;
use crate::notifications::responses::{ListNotificationsResponse, MutationResponse};
use crate::AppState;

pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<ListNotificationsResponse>, ApiError> {
    let data = state
        .notification_repo
        .list_for_user(query.user_id)
        .await?;
    let count = data.len();
    Ok(Json(ListNotificationsResponse { data, count }))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MutationResponse>, ApiError> {
    state.notification_repo.mark_read(id).await?;
    Ok(Json(MutationResponse { ok: true }))
}
