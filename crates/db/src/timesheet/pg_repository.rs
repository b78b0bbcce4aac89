use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::timesheet::models::{Break, BreakCorrection, EntryCorrection, TimeEntry};
use crate::timesheet::repositories::TimesheetRepository;
use stechuhr_common::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgTimesheetRepository {
    pool: PgPool,
}

impl PgTimesheetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_entry_row(row: PgRow) -> TimeEntry {
        TimeEntry {
            id: row.get("id"),
            user_id: row.get("user_id"),
            date: row.get("date"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
            breaks: Vec::new(),
        }
    }

    fn map_break_row(row: PgRow) -> Break {
        Break {
            id: row.get("id"),
            time_entry_id: row.get("time_entry_id"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
            reason: row.get("reason"),
        }
    }

    async fn breaks_for_entry(&self, entry_id: Uuid) -> AppResult<Vec<Break>> {
        let rows = sqlx::query(
            "select id, time_entry_id, start_time, end_time, reason
             from breaks where time_entry_id = $1 order by start_time",
        )
        .bind(entry_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Self::map_break_row).collect())
    }

    async fn entry_with_breaks(&self, row: PgRow) -> AppResult<TimeEntry> {
        let mut entry = Self::map_entry_row(row);
        entry.breaks = self.breaks_for_entry(entry.id).await?;
        Ok(entry)
    }
}

#[async_trait]
impl TimesheetRepository for PgTimesheetRepository {
    async fn clock_in(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<TimeEntry> {
        if self.find_open_entry(user_id).await?.is_some() {
            return Err(AppError::Validation(
                "user is already clocked in".to_string(),
            ));
        }

        let row = sqlx::query(
            "insert into time_entries (id, user_id, date, start_time)
             values ($1, $2, $3, $4)
             returning id, user_id, date, start_time, end_time",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(now.date_naive())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::map_entry_row(row))
    }

    async fn clock_out(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<TimeEntry> {
        let row = sqlx::query(
            "update time_entries set end_time = $1
             where user_id = $2 and end_time is null
             returning id, user_id, date, start_time, end_time",
        )
        .bind(now)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("no open time entry for user".to_string()))?;

        let entry_id: Uuid = row.get("id");
        sqlx::query("update breaks set end_time = $1 where time_entry_id = $2 and end_time is null")
            .bind(now)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.entry_with_breaks(row).await
    }

    async fn close_entry(&self, entry_id: Uuid, now: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "update time_entries set end_time = $1 where id = $2 and end_time is null",
        )
        .bind(now)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("update breaks set end_time = $1 where time_entry_id = $2 and end_time is null")
            .bind(now)
            .bind(entry_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(true)
    }

    async fn find_open_entry(&self, user_id: Uuid) -> AppResult<Option<TimeEntry>> {
        let row = sqlx::query(
            "select id, user_id, date, start_time, end_time
             from time_entries where user_id = $1 and end_time is null",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(self.entry_with_breaks(r).await?)),
            None => Ok(None),
        }
    }

    async fn get_entry(&self, entry_id: Uuid) -> AppResult<Option<TimeEntry>> {
        let row = sqlx::query(
            "select id, user_id, date, start_time, end_time from time_entries where id = $1",
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(self.entry_with_breaks(r).await?)),
            None => Ok(None),
        }
    }

    async fn get_break(&self, break_id: Uuid) -> AppResult<Option<Break>> {
        let row = sqlx::query(
            "select id, time_entry_id, start_time, end_time, reason from breaks where id = $1",
        )
        .bind(break_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(Self::map_break_row))
    }

    async fn start_break(
        &self,
        entry_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Break> {
        if reason.trim().is_empty() {
            return Err(AppError::Validation(
                "break reason must not be empty".to_string(),
            ));
        }

        let open: Option<PgRow> = sqlx::query(
            "select id from breaks where time_entry_id = $1 and end_time is null",
        )
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if open.is_some() {
            return Err(AppError::Validation(
                "another break in this entry is still open".to_string(),
            ));
        }

        let row = sqlx::query(
            "insert into breaks (id, time_entry_id, start_time, reason)
             values ($1, $2, $3, $4)
             returning id, time_entry_id, start_time, end_time, reason",
        )
        .bind(Uuid::new_v4())
        .bind(entry_id)
        .bind(now)
        .bind(reason)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Self::map_break_row(row))
    }

    async fn end_break(&self, entry_id: Uuid, now: DateTime<Utc>) -> AppResult<Break> {
        let row = sqlx::query(
            "update breaks set end_time = $1
             where time_entry_id = $2 and end_time is null
             returning id, time_entry_id, start_time, end_time, reason",
        )
        .bind(now)
        .bind(entry_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("no open break for this entry".to_string()))?;

        Ok(Self::map_break_row(row))
    }

    async fn list_entries(&self, user_id: Option<Uuid>) -> AppResult<Vec<TimeEntry>> {
        let rows = match user_id {
            Some(uid) => {
                sqlx::query(
                    "select id, user_id, date, start_time, end_time from time_entries
                     where user_id = $1 order by start_time desc",
                )
                .bind(uid)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(
                    "select id, user_id, date, start_time, end_time from time_entries
                     order by start_time desc",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| AppError::Database(e.to_string()))?;

        let mut entries: Vec<TimeEntry> = rows.into_iter().map(Self::map_entry_row).collect();
        if entries.is_empty() {
            return Ok(entries);
        }

        let ids: Vec<Uuid> = entries.iter().map(|e| e.id).collect();
        let break_rows = sqlx::query(
            "select id, time_entry_id, start_time, end_time, reason
             from breaks where time_entry_id = any($1) order by start_time",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        for row in break_rows {
            let b = Self::map_break_row(row);
            if let Some(entry) = entries.iter_mut().find(|e| e.id == b.time_entry_id) {
                entry.breaks.push(b);
            }
        }

        Ok(entries)
    }

    async fn apply_entry_correction(
        &self,
        entry_id: Uuid,
        correction: EntryCorrection,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "update time_entries set
               start_time = coalesce($1, start_time),
               end_time = coalesce($2, end_time),
               date = coalesce($3, date)
             where id = $4",
        )
        .bind(correction.start_time)
        .bind(correction.end_time)
        .bind(correction.date)
        .bind(entry_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "time entry not found: {entry_id}"
            )));
        }
        Ok(())
    }

    async fn apply_break_correction(
        &self,
        break_id: Uuid,
        correction: BreakCorrection,
    ) -> AppResult<()> {
        let result = sqlx::query(
            "update breaks set
               start_time = coalesce($1, start_time),
               end_time = coalesce($2, end_time),
               reason = coalesce($3, reason)
             where id = $4",
        )
        .bind(correction.start_time)
        .bind(correction.end_time)
        .bind(correction.reason)
        .bind(break_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("break not found: {break_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn test_repo() -> Option<PgTimesheetRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");

        sqlx::query(
            "create table if not exists time_entries (
               id uuid primary key,
               user_id uuid not null,
               date date not null,
               start_time timestamptz not null,
               end_time timestamptz
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        sqlx::query(
            "create table if not exists breaks (
               id uuid primary key,
               time_entry_id uuid not null,
               start_time timestamptz not null,
               end_time timestamptz,
               reason text not null
             )",
        )
        .execute(&pool)
        .await
        .ok()?;

        Some(PgTimesheetRepository::new(pool))
    }

    #[tokio::test]
    async fn clock_in_twice_fails() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let user = Uuid::new_v4();

        repo.clock_in(user, Utc::now()).await.expect("first clock-in");
        let second = repo.clock_in(user, Utc::now()).await;
        assert!(matches!(second, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn clock_out_closes_open_break() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let user = Uuid::new_v4();

        let entry = repo.clock_in(user, Utc::now()).await.expect("clock in");
        repo.start_break(entry.id, "Mittagspause", Utc::now())
            .await
            .expect("start break");

        let closed = repo.clock_out(user, Utc::now()).await.expect("clock out");
        assert!(closed.end_time.is_some());
        assert!(closed.breaks.iter().all(|b| b.end_time.is_some()));
    }

    #[tokio::test]
    async fn second_open_break_is_rejected() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let user = Uuid::new_v4();

        let entry = repo.clock_in(user, Utc::now()).await.expect("clock in");
        repo.start_break(entry.id, "Pause", Utc::now())
            .await
            .expect("first break");

        let second = repo.start_break(entry.id, "noch eine", Utc::now()).await;
        assert!(matches!(second, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn close_entry_is_idempotent() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let user = Uuid::new_v4();

        let entry = repo.clock_in(user, Utc::now()).await.expect("clock in");
        assert!(repo.close_entry(entry.id, Utc::now()).await.expect("close"));
        assert!(!repo
            .close_entry(entry.id, Utc::now())
            .await
            .expect("second close"));
    }

    #[tokio::test]
    async fn entry_correction_patches_only_given_fields() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let user = Uuid::new_v4();

        let entry = repo.clock_in(user, Utc::now()).await.expect("clock in");
        let new_start = Utc::now() - chrono::Duration::hours(2);

        repo.apply_entry_correction(
            entry.id,
            EntryCorrection {
                start_time: Some(new_start),
                end_time: None,
                date: None,
            },
        )
        .await
        .expect("apply");

        let updated = repo
            .get_entry(entry.id)
            .await
            .expect("get")
            .expect("exists");
        // timestamptz stores microseconds; compare at that precision
        assert_eq!(
            updated.start_time.timestamp_micros(),
            new_start.timestamp_micros()
        );
        assert!(updated.end_time.is_none());
    }
}
