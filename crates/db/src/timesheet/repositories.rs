use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::timesheet::models::{Break, BreakCorrection, EntryCorrection, TimeEntry};
use stechuhr_common::error::AppResult;

#[async_trait]
pub trait TimesheetRepository: Send + Sync {
    /// Open a new entry for the user. Fails with a validation error if the
    /// user already has an open entry.
    async fn clock_in(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<TimeEntry>;

    /// Close the user's open entry and any open break in it.
    /// Fails with `NotFound` if the user has no open entry.
    async fn clock_out(&self, user_id: Uuid, now: DateTime<Utc>) -> AppResult<TimeEntry>;

    /// Close a specific entry and any open break in it, if still open.
    /// Returns `false` when the entry was already closed (idempotent).
    async fn close_entry(&self, entry_id: Uuid, now: DateTime<Utc>) -> AppResult<bool>;

    async fn find_open_entry(&self, user_id: Uuid) -> AppResult<Option<TimeEntry>>;

    async fn get_entry(&self, entry_id: Uuid) -> AppResult<Option<TimeEntry>>;

    async fn get_break(&self, break_id: Uuid) -> AppResult<Option<Break>>;

    /// Start a break in the user's open entry. Fails while another break in
    /// the same entry is open, or when the reason is empty.
    async fn start_break(
        &self,
        entry_id: Uuid,
        reason: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Break>;

    /// Close the open break of the entry. Fails with `NotFound` if none is open.
    async fn end_break(&self, entry_id: Uuid, now: DateTime<Utc>) -> AppResult<Break>;

    /// List entries newest-first, optionally for a single user, with breaks attached.
    async fn list_entries(&self, user_id: Option<Uuid>) -> AppResult<Vec<TimeEntry>>;

    /// Write back an approved time-entry correction.
    async fn apply_entry_correction(
        &self,
        entry_id: Uuid,
        correction: EntryCorrection,
    ) -> AppResult<()>;

    /// Write back an approved break correction.
    async fn apply_break_correction(
        &self,
        break_id: Uuid,
        correction: BreakCorrection,
    ) -> AppResult<()>;
}
