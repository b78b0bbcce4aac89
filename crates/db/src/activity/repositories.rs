use async_trait::async_trait;

use crate::activity::models::{ActivityFilter, UnifiedActivity};
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Insert the record, or overwrite all non-key fields if a row with the
    /// same `(source_system, source_id)` already exists.
    async fn upsert(&self, activity: UnifiedActivity) -> AppResult<()>;

    /// List activities newest-first, optionally restricted to one source.
    async fn list(&self, filter: ActivityFilter) -> AppResult<Vec<UnifiedActivity>>;
}
