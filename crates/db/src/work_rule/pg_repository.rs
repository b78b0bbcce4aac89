use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::work_rule::models::{RuleUpdate, WorkTimeRule};
use crate::work_rule::repositories::WorkRuleRepository;
use stechuhr_common::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgWorkRuleRepository {
    pool: PgPool,
}

impl PgWorkRuleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> WorkTimeRule {
        WorkTimeRule {
            user_id: row.get("user_id"),
            earliest_login_time: row.get("earliest_login_time"),
            latest_logout_time: row.get("latest_logout_time"),
            is_active: row.get("is_active"),
        }
    }
}

#[async_trait]
impl WorkRuleRepository for PgWorkRuleRepository {
    async fn get_for_user(&self, user_id: Uuid) -> AppResult<Option<WorkTimeRule>> {
        let row = sqlx::query(
            "select user_id, earliest_login_time, latest_logout_time, is_active
             from work_time_rules where user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::map_row))
    }

    async fn ensure_default(&self, user_id: Uuid) -> AppResult<WorkTimeRule> {
        let row = sqlx::query(
            "insert into work_time_rules (user_id, earliest_login_time, latest_logout_time, is_active)
             values ($1, '08:00:00', '18:00:00', true)
             on conflict (user_id) do update set user_id = excluded.user_id
             returning user_id, earliest_login_time, latest_logout_time, is_active",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::map_row(row))
    }

    async fn update(&self, user_id: Uuid, update: RuleUpdate) -> AppResult<WorkTimeRule> {
        let row = sqlx::query(
            "update work_time_rules set
               earliest_login_time = coalesce($1, earliest_login_time),
               latest_logout_time = coalesce($2, latest_logout_time),
               is_active = coalesce($3, is_active)
             where user_id = $4
             returning user_id, earliest_login_time, latest_logout_time, is_active",
        )
        .bind(update.earliest_login_time)
        .bind(update.latest_logout_time)
        .bind(update.is_active)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("no work time rule for user: {user_id}")))?;

        Ok(Self::map_row(row))
    }

    async fn list(&self) -> AppResult<Vec<WorkTimeRule>> {
        let rows = sqlx::query(
            "select user_id, earliest_login_time, latest_logout_time, is_active
             from work_time_rules order by user_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }
}
