use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub start_time: DateTime<Utc>,
    /// `None` while the user is clocked in.
    pub end_time: Option<DateTime<Utc>>,
    pub breaks: Vec<Break>,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn open_break(&self) -> Option<&Break> {
        self.breaks.iter().find(|b| b.end_time.is_none())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Break {
    pub id: Uuid,
    pub time_entry_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: String,
}

/// Patch applied to a time entry when a correction is approved.
/// `None` means "leave this field unchanged".
#[derive(Debug, Clone, Default)]
pub struct EntryCorrection {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
}

/// Patch applied to a break when a correction is approved.
#[derive(Debug, Clone, Default)]
pub struct BreakCorrection {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub reason: Option<String>,
}
