use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::activity::models::{
    ActivityFilter, ActivityType, Direction, SourceSystem, UnifiedActivity,
};
use crate::activity::repositories::ActivityRepository;
use stechuhr_common::error::{AppError, AppResult};

const ACTIVITY_COLUMNS: &str = "source_system, source_id, activity_type, direction, timestamp, \
     duration_seconds, contact_name, contact_email, contact_phone, subject, preview, \
     user_name, user_email, raw_data";

#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> AppResult<UnifiedActivity> {
        let source_raw: String = row.get("source_system");
        let type_raw: String = row.get("activity_type");
        let direction_raw: Option<String> = row.get("direction");

        let direction = match direction_raw {
            Some(d) => Some(Direction::from_str(&d).map_err(AppError::Internal)?),
            None => None,
        };

        Ok(UnifiedActivity {
            source_system: SourceSystem::from_str(&source_raw).map_err(AppError::Internal)?,
            source_id: row.get("source_id"),
            activity_type: ActivityType::from_str(&type_raw).map_err(AppError::Internal)?,
            direction,
            timestamp: row.get("timestamp"),
            duration_seconds: row.get("duration_seconds"),
            contact_name: row.get("contact_name"),
            contact_email: row.get("contact_email"),
            contact_phone: row.get("contact_phone"),
            subject: row.get("subject"),
            preview: row.get("preview"),
            user_name: row.get("user_name"),
            user_email: row.get("user_email"),
            raw_data: row.get("raw_data"),
        })
    }
}

#[async_trait]
impl ActivityRepository for PgActivityRepository {
    async fn upsert(&self, activity: UnifiedActivity) -> AppResult<()> {
        sqlx::query(
            "insert into activities (source_system, source_id, activity_type, direction, \
             timestamp, duration_seconds, contact_name, contact_email, contact_phone, \
             subject, preview, user_name, user_email, raw_data)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             on conflict (source_system, source_id) do update set
               activity_type = excluded.activity_type,
               direction = excluded.direction,
               timestamp = excluded.timestamp,
               duration_seconds = excluded.duration_seconds,
               contact_name = excluded.contact_name,
               contact_email = excluded.contact_email,
               contact_phone = excluded.contact_phone,
               subject = excluded.subject,
               preview = excluded.preview,
               user_name = excluded.user_name,
               user_email = excluded.user_email,
               raw_data = excluded.raw_data",
        )
        .bind(activity.source_system.as_str())
        .bind(&activity.source_id)
        .bind(activity.activity_type.as_str())
        .bind(activity.direction.map(|d| d.as_str()))
        .bind(activity.timestamp)
        .bind(activity.duration_seconds)
        .bind(&activity.contact_name)
        .bind(&activity.contact_email)
        .bind(&activity.contact_phone)
        .bind(&activity.subject)
        .bind(&activity.preview)
        .bind(&activity.user_name)
        .bind(&activity.user_email)
        .bind(&activity.raw_data)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, filter: ActivityFilter) -> AppResult<Vec<UnifiedActivity>> {
        let limit = filter.limit.unwrap_or(200);

        let rows = match filter.source {
            Some(source) => {
                sqlx::query(&format!(
                    "select {ACTIVITY_COLUMNS} from activities \
                     where source_system = $1 order by timestamp desc limit $2"
                ))
                .bind(source.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "select {ACTIVITY_COLUMNS} from activities \
                     order by timestamp desc limit $1"
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;
    use chrono::Utc;

    async fn test_repo() -> Option<PgActivityRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists activities (
               source_system text not null,
               source_id text not null,
               activity_type text not null,
               direction text,
               timestamp timestamptz not null,
               duration_seconds int,
               contact_name text,
               contact_email text,
               contact_phone text,
               subject text,
               preview text,
               user_name text,
               user_email text,
               raw_data jsonb not null default '{}'::jsonb,
               primary key (source_system, source_id)
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some(PgActivityRepository::new(pool))
    }

    fn sample_call(source_id: &str) -> UnifiedActivity {
        UnifiedActivity {
            source_system: SourceSystem::Telephony,
            source_id: source_id.to_string(),
            activity_type: ActivityType::Call,
            direction: Some(Direction::Inbound),
            timestamp: Utc::now(),
            duration_seconds: Some(245),
            contact_name: Some("Max Mustermann".to_string()),
            contact_email: None,
            contact_phone: Some("+49 171 1234567".to_string()),
            subject: None,
            preview: None,
            user_name: Some("Ines Cürten".to_string()),
            user_email: None,
            raw_data: serde_json::json!({"id": source_id}),
        }
    }

    #[tokio::test]
    async fn upsert_twice_keeps_single_row() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let id = uuid::Uuid::new_v4().to_string();

        repo.upsert(sample_call(&id)).await.expect("first upsert");

        let mut updated = sample_call(&id);
        updated.duration_seconds = Some(300);
        repo.upsert(updated).await.expect("second upsert");

        let rows = repo
            .list(ActivityFilter {
                source: Some(SourceSystem::Telephony),
                limit: None,
            })
            .await
            .expect("list");

        let matching: Vec<_> = rows.iter().filter(|a| a.source_id == id).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].duration_seconds, Some(300));
    }

    #[tokio::test]
    async fn list_filters_by_source() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let id = uuid::Uuid::new_v4().to_string();
        repo.upsert(sample_call(&id)).await.expect("upsert");

        let rows = repo
            .list(ActivityFilter {
                source: Some(SourceSystem::Mail),
                limit: None,
            })
            .await
            .expect("list");
        assert!(rows.iter().all(|a| a.source_system == SourceSystem::Mail));
    }
}
