use async_trait::async_trait;

use crate::activity::models::SourceSystem;
use crate::sync_state::models::SyncStatus;
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait SyncStatusRepository: Send + Sync {
    /// Stamp a successful run: fresh `last_sync_timestamp` and
    /// `last_successful_sync`, status `success`, error cleared.
    async fn mark_success(&self, source: SourceSystem) -> AppResult<()>;

    /// Stamp a failed run: fresh `last_sync_timestamp` only, status `error`,
    /// the original error message preserved verbatim.
    async fn mark_failure(&self, source: SourceSystem, error_message: &str) -> AppResult<()>;

    async fn list(&self) -> AppResult<Vec<SyncStatus>>;
}
