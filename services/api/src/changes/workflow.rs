use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use stechuhr_common::error::{AppError, AppResult};
use stechuhr_db::change_request::models::{
    ChangeRequest, ChangeRequestStatus, CorrectionKind, NewChangeRequest, Resolution,
};
use stechuhr_db::change_request::repositories::ChangeRequestRepository;
use stechuhr_db::timesheet::models::{BreakCorrection, EntryCorrection};
use stechuhr_db::timesheet::repositories::TimesheetRepository;

pub struct CreateChangeRequest {
    pub user_id: Uuid,
    pub time_entry_id: Uuid,
    pub kind: CorrectionKind,
    pub change_reason: String,
}

/// Admin-side overrides on a modify. Each set field wins over the
/// employee's requested value.
#[derive(Debug, Clone, Default)]
pub struct ModifyOverrides {
    pub final_start_time: Option<DateTime<Utc>>,
    pub final_end_time: Option<DateTime<Utc>>,
    pub final_reason: Option<String>,
    pub final_date: Option<NaiveDate>,
}

/// Drives a change request through `pending → approved|rejected|modified`.
///
/// Approve and modify transition the stored request first (the transition is
/// guarded against concurrent processing in the repository), then write the
/// effective values back to the timesheet. If the write-back target vanished
/// in between, the transition is rolled back to `pending` so the request is
/// never marked resolved with a silently-failed write.
pub struct ChangeRequestWorkflow<C, T> {
    change_repo: C,
    timesheet_repo: T,
}

impl<C, T> ChangeRequestWorkflow<C, T>
where
    C: ChangeRequestRepository,
    T: TimesheetRepository,
{
    pub fn new(change_repo: C, timesheet_repo: T) -> Self {
        Self {
            change_repo,
            timesheet_repo,
        }
    }

    /// Create a request, snapshotting the live values it proposes to change.
    pub async fn create(&self, input: CreateChangeRequest) -> AppResult<ChangeRequest> {
        if input.change_reason.trim().is_empty() {
            return Err(AppError::Validation(
                "change_reason must not be empty".to_string(),
            ));
        }

        let entry = self
            .timesheet_repo
            .get_entry(input.time_entry_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("time entry not found: {}", input.time_entry_id))
            })?;

        let (current_start_time, current_end_time, current_reason) = match &input.kind {
            CorrectionKind::TimeEntry { .. } => (Some(entry.start_time), entry.end_time, None),
            CorrectionKind::Break { break_id, .. } => {
                let brk = self
                    .timesheet_repo
                    .get_break(*break_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound(format!("break not found: {break_id}"))
                    })?;
                if brk.time_entry_id != entry.id {
                    return Err(AppError::Validation(format!(
                        "break {break_id} does not belong to time entry {}",
                        entry.id
                    )));
                }
                // Never allow a request that would juggle two open breaks:
                // while a break is open, only that break may be corrected.
                if let Some(open) = entry.open_break() {
                    if open.id != *break_id {
                        return Err(AppError::Validation(format!(
                            "time entry {} already has an open break, only that break can be corrected",
                            entry.id
                        )));
                    }
                }
                (Some(brk.start_time), brk.end_time, Some(brk.reason))
            }
        };

        self.change_repo
            .create(NewChangeRequest {
                user_id: input.user_id,
                time_entry_id: input.time_entry_id,
                kind: input.kind,
                current_start_time,
                current_end_time,
                current_reason,
                change_reason: input.change_reason,
            })
            .await
    }

    /// Approve: apply exactly the employee's requested values.
    pub async fn approve(
        &self,
        id: Uuid,
        admin_id: Uuid,
        comment: Option<String>,
    ) -> AppResult<ChangeRequest> {
        let resolution = Resolution {
            admin_id,
            comment,
            ..Default::default()
        };
        let request = self
            .change_repo
            .transition(id, ChangeRequestStatus::Approved, resolution)
            .await?;

        self.write_back(&request).await?;
        Ok(request)
    }

    /// Reject: record the decision, never touch the timesheet.
    pub async fn reject(
        &self,
        id: Uuid,
        admin_id: Uuid,
        comment: String,
    ) -> AppResult<ChangeRequest> {
        if comment.trim().is_empty() {
            return Err(AppError::Validation(
                "a rejection requires an admin comment".to_string(),
            ));
        }

        self.change_repo
            .transition(
                id,
                ChangeRequestStatus::Rejected,
                Resolution {
                    admin_id,
                    comment: Some(comment),
                    ..Default::default()
                },
            )
            .await
    }

    /// Modify: apply the requested values with the admin's overrides winning
    /// field by field.
    pub async fn modify(
        &self,
        id: Uuid,
        admin_id: Uuid,
        comment: Option<String>,
        overrides: ModifyOverrides,
    ) -> AppResult<ChangeRequest> {
        let resolution = Resolution {
            admin_id,
            comment,
            final_start_time: overrides.final_start_time,
            final_end_time: overrides.final_end_time,
            final_reason: overrides.final_reason,
            final_date: overrides.final_date,
        };
        let request = self
            .change_repo
            .transition(id, ChangeRequestStatus::Modified, resolution)
            .await?;

        self.write_back(&request).await?;
        Ok(request)
    }

    /// Write the effective values into the live timesheet. Re-verifies the
    /// target still exists; when it is gone, the transition is rolled back
    /// and the caller gets the failure.
    async fn write_back(&self, request: &ChangeRequest) -> AppResult<()> {
        match &request.kind {
            CorrectionKind::TimeEntry {
                new_start_time,
                new_end_time,
                new_date,
            } => {
                if self
                    .timesheet_repo
                    .get_entry(request.time_entry_id)
                    .await?
                    .is_none()
                {
                    return self.roll_back(request, "time entry").await;
                }

                let correction = EntryCorrection {
                    start_time: request.final_start_time.or(*new_start_time),
                    end_time: request.final_end_time.or(*new_end_time),
                    date: request.final_date.or(*new_date),
                };
                self.timesheet_repo
                    .apply_entry_correction(request.time_entry_id, correction)
                    .await
            }
            CorrectionKind::Break {
                break_id,
                new_start_time,
                new_end_time,
                new_reason,
            } => {
                if self.timesheet_repo.get_break(*break_id).await?.is_none() {
                    return self.roll_back(request, "break").await;
                }

                let correction = BreakCorrection {
                    start_time: request.final_start_time.or(*new_start_time),
                    end_time: request.final_end_time.or(*new_end_time),
                    reason: request.final_reason.clone().or_else(|| new_reason.clone()),
                };
                self.timesheet_repo
                    .apply_break_correction(*break_id, correction)
                    .await
            }
        }
    }

    async fn roll_back(&self, request: &ChangeRequest, target: &str) -> AppResult<()> {
        tracing::warn!(
            request_id = %request.id,
            target,
            "write-back target vanished, rolling the request back to pending"
        );
        self.change_repo.revert_to_pending(request.id).await?;
        Err(AppError::NotFound(format!(
            "{target} for change request {} no longer exists; request reverted to pending",
            request.id
        )))
    }
}
