use axum::extract::State;
use axum::Json;
use chrono::Utc;

use stechuhr_common::error::AppError;
use stechuhr_db::user::models::Role;
use stechuhr_db::user::repositories::UserRepository;
use stechuhr_db::work_rule::repositories::WorkRuleRepository;

use crate::error::ApiError;
use crate::session::requests::{LoginRequest, SetPinRequest};
use crate::session::responses::LoginResponse;
use crate::worktime::rules::too_early_for_login;
use crate::AppState;

fn validate_pin_format(pin: &str) -> Result<(), AppError> {
    if pin.len() != 4 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::Validation(
            "PIN must be exactly 4 digits".to_string(),
        ));
    }
    Ok(())
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_repo
        .get_by_name(body.name.trim())
        .await?
        .ok_or_else(|| AppError::Validation("invalid name or PIN".to_string()))?;

    // Users without a PIN must set one first; the client switches to the
    // PIN-setup flow on this response.
    if user.is_first_login() {
        return Ok(Json(LoginResponse {
            user,
            first_login: true,
        }));
    }

    let user = state
        .user_repo
        .authenticate(body.name.trim(), &body.pin)
        .await?
        .ok_or_else(|| AppError::Validation("invalid name or PIN".to_string()))?;

    // An active rule blocks employees from logging in too early in the
    // local day. Admins are exempt.
    if user.role == Role::Employee {
        if let Some(rule) = state.work_rule_repo.get_for_user(user.id).await? {
            if too_early_for_login(&rule, Utc::now()) {
                return Err(AppError::Validation(format!(
                    "too early to log in: work starts at {} (local time)",
                    rule.earliest_login_time.format("%H:%M")
                ))
                .into());
            }
        }
    }

    Ok(Json(LoginResponse {
        user,
        first_login: false,
    }))
}

pub async fn set_pin(
    State(state): State<AppState>,
    Json(body): Json<SetPinRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_pin_format(&body.pin)?;

    let user = state
        .user_repo
        .get_by_name(body.name.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {}", body.name.trim())))?;

    state.user_repo.set_pin(user.id, &body.pin).await?;

    let user = state
        .user_repo
        .get(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user not found: {}", user.id)))?;

    Ok(Json(LoginResponse {
        user,
        first_login: false,
    }))
}
