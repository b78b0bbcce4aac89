use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::notification::models::{NewNotification, Notification};
use crate::notification::repositories::NotificationRepository;
use stechuhr_common::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> Notification {
        Notification {
            id: row.get("id"),
            user_id: row.get("user_id"),
            message: row.get("message"),
            kind: row.get("kind"),
            related_user_id: row.get("related_user_id"),
            related_user_name: row.get("related_user_name"),
            is_read: row.get("is_read"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, notification: NewNotification) -> AppResult<Notification> {
        let row = sqlx::query(
            "insert into notifications (id, user_id, message, kind, related_user_id, \
             related_user_name, is_read, created_at)
             values ($1, $2, $3, $4, $5, $6, false, $7)
             returning id, user_id, message, kind, related_user_id, related_user_name, \
             is_read, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(notification.user_id)
        .bind(&notification.message)
        .bind(&notification.kind)
        .bind(notification.related_user_id)
        .bind(&notification.related_user_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::map_row(row))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Notification>> {
        let rows = sqlx::query(
            "select id, user_id, message, kind, related_user_id, related_user_name, \
             is_read, created_at from notifications
             where user_id = $1 order by created_at desc",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_row).collect())
    }

    async fn mark_read(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("update notifications set is_read = true where id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("notification not found: {id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn test_repo() -> Option<PgNotificationRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists notifications (
               id uuid primary key,
               user_id uuid not null,
               message text not null,
               kind text not null,
               related_user_id uuid,
               related_user_name text,
               is_read boolean not null default false,
               created_at timestamptz not null default now()
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some(PgNotificationRepository::new(pool))
    }

    #[tokio::test]
    async fn create_and_list_for_recipient() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let recipient = Uuid::new_v4();

        repo.create(NewNotification {
            user_id: recipient,
            message: "Lisa Bayer wurde automatisch um 18:00 Uhr ausgeloggt.".to_string(),
            kind: "auto_clock_out".to_string(),
            related_user_id: Some(Uuid::new_v4()),
            related_user_name: Some("Lisa Bayer".to_string()),
        })
        .await
        .expect("create");

        let listed = repo.list_for_user(recipient).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].is_read);

        repo.mark_read(listed[0].id).await.expect("mark read");
        let listed = repo.list_for_user(recipient).await.expect("list again");
        assert!(listed[0].is_read);
    }
}
