use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use crate::change_request::models::{
    ChangeRequest, ChangeRequestFilter, ChangeRequestStatus, CorrectionKind, NewChangeRequest,
    Resolution,
};
use crate::change_request::repositories::ChangeRequestRepository;
use stechuhr_common::error::{AppError, AppResult};

const REQUEST_COLUMNS: &str = "id, user_id, time_entry_id, request_type, break_id, \
     new_start_time, new_end_time, new_reason, new_date, \
     current_start_time, current_end_time, current_reason, change_reason, status, \
     admin_comment, final_start_time, final_end_time, final_reason, final_date, \
     processed_at, processed_by, created_at";

#[derive(Clone)]
pub struct PgChangeRequestRepository {
    pool: PgPool,
}

impl PgChangeRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> AppResult<ChangeRequest> {
        let status_raw: String = row.get("status");
        let request_type: String = row.get("request_type");

        let kind = match request_type.as_str() {
            "time_entry" => CorrectionKind::TimeEntry {
                new_start_time: row.get("new_start_time"),
                new_end_time: row.get("new_end_time"),
                new_date: row.get("new_date"),
            },
            "break" => CorrectionKind::Break {
                break_id: row
                    .try_get("break_id")
                    .map_err(|e| AppError::Internal(format!("break request without break_id: {e}")))?,
                new_start_time: row.get("new_start_time"),
                new_end_time: row.get("new_end_time"),
                new_reason: row.get("new_reason"),
            },
            other => {
                return Err(AppError::Internal(format!(
                    "unknown request type: {other}"
                )))
            }
        };

        Ok(ChangeRequest {
            id: row.get("id"),
            user_id: row.get("user_id"),
            time_entry_id: row.get("time_entry_id"),
            kind,
            current_start_time: row.get("current_start_time"),
            current_end_time: row.get("current_end_time"),
            current_reason: row.get("current_reason"),
            change_reason: row.get("change_reason"),
            status: ChangeRequestStatus::from_str(&status_raw).map_err(AppError::Internal)?,
            admin_comment: row.get("admin_comment"),
            final_start_time: row.get("final_start_time"),
            final_end_time: row.get("final_end_time"),
            final_reason: row.get("final_reason"),
            final_date: row.get("final_date"),
            processed_at: row.get("processed_at"),
            processed_by: row.get("processed_by"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl ChangeRequestRepository for PgChangeRequestRepository {
    async fn create(&self, request: NewChangeRequest) -> AppResult<ChangeRequest> {
        let (break_id, new_start, new_end, new_reason, new_date) = match &request.kind {
            CorrectionKind::TimeEntry {
                new_start_time,
                new_end_time,
                new_date,
            } => (None, *new_start_time, *new_end_time, None, *new_date),
            CorrectionKind::Break {
                break_id,
                new_start_time,
                new_end_time,
                new_reason,
            } => (
                Some(*break_id),
                *new_start_time,
                *new_end_time,
                new_reason.clone(),
                None,
            ),
        };

        let row = sqlx::query(&format!(
            "insert into change_requests (id, user_id, time_entry_id, request_type, break_id, \
             new_start_time, new_end_time, new_reason, new_date, \
             current_start_time, current_end_time, current_reason, change_reason, status, created_at)
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, 'pending', $14)
             returning {REQUEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.user_id)
        .bind(request.time_entry_id)
        .bind(request.kind.request_type())
        .bind(break_id)
        .bind(new_start)
        .bind(new_end)
        .bind(new_reason)
        .bind(new_date)
        .bind(request.current_start_time)
        .bind(request.current_end_time)
        .bind(request.current_reason)
        .bind(&request.change_reason)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Self::map_row(row)
    }

    async fn get(&self, id: Uuid) -> AppResult<Option<ChangeRequest>> {
        let row = sqlx::query(&format!(
            "select {REQUEST_COLUMNS} from change_requests where id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        row.map(Self::map_row).transpose()
    }

    async fn list(&self, filter: ChangeRequestFilter) -> AppResult<Vec<ChangeRequest>> {
        let mut qb = sqlx::QueryBuilder::new(format!(
            "select {REQUEST_COLUMNS} from change_requests where true"
        ));

        if let Some(user_id) = filter.user_id {
            qb.push(" and user_id = ").push_bind(user_id);
        }
        if filter.pending_only {
            qb.push(" and status = 'pending'");
        }
        qb.push(" order by created_at desc");

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }

    async fn transition(
        &self,
        id: Uuid,
        status: ChangeRequestStatus,
        resolution: Resolution,
    ) -> AppResult<ChangeRequest> {
        if status == ChangeRequestStatus::Pending {
            return Err(AppError::Validation(
                "cannot transition a request to pending".to_string(),
            ));
        }

        let row = sqlx::query(&format!(
            "update change_requests
             set status = $1, admin_comment = $2, final_start_time = $3, final_end_time = $4,
                 final_reason = $5, final_date = $6, processed_at = $7, processed_by = $8
             where id = $9 and status = 'pending'
             returning {REQUEST_COLUMNS}"
        ))
        .bind(status.as_str())
        .bind(&resolution.comment)
        .bind(resolution.final_start_time)
        .bind(resolution.final_end_time)
        .bind(&resolution.final_reason)
        .bind(resolution.final_date)
        .bind(Utc::now())
        .bind(resolution.admin_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Self::map_row(r),
            // Distinguish "gone" from "already resolved" for the caller.
            None => match self.get(id).await? {
                Some(existing) => Err(AppError::AlreadyProcessed(format!(
                    "change request {id} is already {}",
                    existing.status.as_str()
                ))),
                None => Err(AppError::NotFound(format!("change request not found: {id}"))),
            },
        }
    }

    async fn revert_to_pending(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "update change_requests
             set status = 'pending', admin_comment = null, final_start_time = null,
                 final_end_time = null, final_reason = null, final_date = null,
                 processed_at = null, processed_by = null
             where id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("change request not found: {id}")));
        }
        Ok(())
    }
}
