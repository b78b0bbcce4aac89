use async_trait::async_trait;
use uuid::Uuid;

use crate::work_rule::models::{RuleUpdate, WorkTimeRule};
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait WorkRuleRepository: Send + Sync {
    async fn get_for_user(&self, user_id: Uuid) -> AppResult<Option<WorkTimeRule>>;

    /// Create the default 08:00–18:00 active rule for the user if none exists
    /// yet; returns the stored rule either way.
    async fn ensure_default(&self, user_id: Uuid) -> AppResult<WorkTimeRule>;

    async fn update(&self, user_id: Uuid, update: RuleUpdate) -> AppResult<WorkTimeRule>;

    async fn list(&self) -> AppResult<Vec<WorkTimeRule>>;
}
