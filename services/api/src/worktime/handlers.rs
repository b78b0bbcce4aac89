use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use stechuhr_common::error::AppError;
use stechuhr_db::notification::models::NewNotification;
use stechuhr_db::notification::repositories::NotificationRepository;
use stechuhr_db::timesheet::repositories::TimesheetRepository;
use stechuhr_db::user::models::{Role, User};
use stechuhr_db::user::repositories::UserRepository;
use stechuhr_db::work_rule::models::{RuleUpdate, WorkTimeRule};
use stechuhr_db::work_rule::repositories::WorkRuleRepository;

use crate::error::ApiError;
use crate::worktime::requests::AutoClockOutCheckRequest;
use crate::worktime::responses::{AutoClockOutResponse, ListRulesResponse};
use crate::worktime::rules::auto_clock_out_reason;
use crate::AppState;

/// Poll target for clients with an open entry. Closes the entry when the
/// work-time rules say so and notifies the employee plus every admin.
/// Calling it again after the entry is closed does nothing.
pub async fn auto_clock_out_check(
    State(state): State<AppState>,
    Json(body): Json<AutoClockOutCheckRequest>,
) -> Result<Json<AutoClockOutResponse>, ApiError> {
    let now = Utc::now();

    let entry = match state.timesheet_repo.find_open_entry(body.user_id).await? {
        Some(entry) => entry,
        None => {
            return Ok(Json(AutoClockOutResponse {
                clocked_out: false,
                message: None,
            }))
        }
    };

    let rule = state.work_rule_repo.get_for_user(body.user_id).await?;
    let reason = match auto_clock_out_reason(rule.as_ref(), entry.start_time, now) {
        Some(reason) => reason,
        None => {
            return Ok(Json(AutoClockOutResponse {
                clocked_out: false,
                message: None,
            }))
        }
    };

    // Another poll may have closed the entry in the meantime; only the call
    // that actually closes it sends notifications.
    let closed = state.timesheet_repo.close_entry(entry.id, now).await?;
    if !closed {
        return Ok(Json(AutoClockOutResponse {
            clocked_out: false,
            message: None,
        }));
    }

    let user = state
        .user_repo
        .get(body.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {}", body.user_id)))?;
    let message = reason.message_for(&user.name);

    tracing::info!(user_id = %user.id, entry_id = %entry.id, %message, "auto clock-out");
    notify_auto_clock_out(&state, &user, &message).await;

    Ok(Json(AutoClockOutResponse {
        clocked_out: true,
        message: Some(message),
    }))
}

/// One notification for the affected employee and one per admin. A failed
/// notification is logged, never fails the clock-out that already happened.
async fn notify_auto_clock_out(state: &AppState, user: &User, message: &str) {
    let mut recipients = vec![user.id];
    match state.user_repo.list_admins().await {
        Ok(admins) => recipients.extend(admins.iter().map(|a| a.id)),
        Err(e) => tracing::error!(error = %e, "failed to list admins for notification"),
    }

    for recipient in recipients {
        let result = state
            .notification_repo
            .create(NewNotification {
                user_id: recipient,
                message: message.to_string(),
                kind: "auto_clock_out".to_string(),
                related_user_id: Some(user.id),
                related_user_name: Some(user.name.clone()),
            })
            .await;
        if let Err(e) = result {
            tracing::error!(recipient = %recipient, error = %e, "failed to create notification");
        }
    }
}

/// Admin view of all rules; employees without one get the 08:00–18:00
/// default created on the fly.
pub async fn list_rules(
    State(state): State<AppState>,
) -> Result<Json<ListRulesResponse>, ApiError> {
    let users = state.user_repo.list().await?;
    for user in users.iter().filter(|u| u.role == Role::Employee) {
        state.work_rule_repo.ensure_default(user.id).await?;
    }

    let data = state.work_rule_repo.list().await?;
    let count = data.len();
    Ok(Json(ListRulesResponse { data, count }))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(update): Json<RuleUpdate>,
) -> Result<Json<WorkTimeRule>, ApiError> {
    // Partial updates are validated against the stored rule so the
    // effective window can never end up inverted.
    let current = state.work_rule_repo.ensure_default(user_id).await?;
    let earliest = update
        .earliest_login_time
        .unwrap_or(current.earliest_login_time);
    let latest = update
        .latest_logout_time
        .unwrap_or(current.latest_logout_time);
    if earliest >= latest {
        return Err(AppError::Validation(
            "earliest_login_time must be before latest_logout_time".to_string(),
        )
        .into());
    }

    let rule = state.work_rule_repo.update(user_id, update).await?;
    Ok(Json(rule))
}
