use async_trait::async_trait;
use uuid::Uuid;

use crate::change_request::models::{
    ChangeRequest, ChangeRequestFilter, ChangeRequestStatus, NewChangeRequest, Resolution,
};
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait ChangeRequestRepository: Send + Sync {
    async fn create(&self, request: NewChangeRequest) -> AppResult<ChangeRequest>;

    async fn get(&self, id: Uuid) -> AppResult<Option<ChangeRequest>>;

    async fn list(&self, filter: ChangeRequestFilter) -> AppResult<Vec<ChangeRequest>>;

    /// Move a request out of `pending`, stamping `processed_at`/`processed_by`
    /// and the resolution fields. Fails with `AlreadyProcessed` when the
    /// request exists but is no longer pending, `NotFound` when it does not
    /// exist.
    async fn transition(
        &self,
        id: Uuid,
        status: ChangeRequestStatus,
        resolution: Resolution,
    ) -> AppResult<ChangeRequest>;

    /// Roll a just-transitioned request back to `pending`, clearing all
    /// resolution fields. Used when the write-back target vanished between
    /// transition and write-back.
    async fn revert_to_pending(&self, id: Uuid) -> AppResult<()>;
}
