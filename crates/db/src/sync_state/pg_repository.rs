use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, PgPool, Row};

use crate::activity::models::SourceSystem;
use crate::sync_state::models::SyncStatus;
use crate::sync_state::repositories::SyncStatusRepository;
use stechuhr_common::error::{AppError, AppResult};

#[derive(Clone)]
pub struct PgSyncStatusRepository {
    pool: PgPool,
}

impl PgSyncStatusRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_row(row: PgRow) -> AppResult<SyncStatus> {
        let source_raw: String = row.get("source_system");
        Ok(SyncStatus {
            source_system: SourceSystem::from_str(&source_raw).map_err(AppError::Internal)?,
            last_sync_timestamp: row.get("last_sync_timestamp"),
            last_successful_sync: row.get("last_successful_sync"),
            sync_status: row.get("sync_status"),
            error_message: row.get("error_message"),
        })
    }
}

#[async_trait]
impl SyncStatusRepository for PgSyncStatusRepository {
    async fn mark_success(&self, source: SourceSystem) -> AppResult<()> {
        let result = sqlx::query(
            "update sync_status
             set last_sync_timestamp = $1, last_successful_sync = $1,
                 sync_status = 'success', error_message = null
             where source_system = $2",
        )
        .bind(Utc::now())
        .bind(source.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "sync_status row missing for source: {}",
                source.as_str()
            )));
        }
        Ok(())
    }

    async fn mark_failure(&self, source: SourceSystem, error_message: &str) -> AppResult<()> {
        let result = sqlx::query(
            "update sync_status
             set last_sync_timestamp = $1, sync_status = 'error', error_message = $2
             where source_system = $3",
        )
        .bind(Utc::now())
        .bind(error_message)
        .bind(source.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "sync_status row missing for source: {}",
                source.as_str()
            )));
        }
        Ok(())
    }

    async fn list(&self) -> AppResult<Vec<SyncStatus>> {
        let rows = sqlx::query(
            "select source_system, last_sync_timestamp, last_successful_sync, \
             sync_status, error_message from sync_status order by source_system",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::map_row).collect()
    }
}
