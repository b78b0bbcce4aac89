use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeRequestStatus {
    Pending,
    Approved,
    Rejected,
    Modified,
}

impl ChangeRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Modified => "modified",
        }
    }
}

impl FromStr for ChangeRequestStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "modified" => Ok(Self::Modified),
            _ => Err(format!("unknown change request status: {value}")),
        }
    }
}

/// The requested correction, tagged by what it targets. Absent fields mean
/// "no change to this field".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum CorrectionKind {
    TimeEntry {
        new_start_time: Option<DateTime<Utc>>,
        new_end_time: Option<DateTime<Utc>>,
        new_date: Option<NaiveDate>,
    },
    Break {
        break_id: Uuid,
        new_start_time: Option<DateTime<Utc>>,
        new_end_time: Option<DateTime<Utc>>,
        new_reason: Option<String>,
    },
}

impl CorrectionKind {
    pub fn request_type(&self) -> &'static str {
        match self {
            Self::TimeEntry { .. } => "time_entry",
            Self::Break { .. } => "break",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub time_entry_id: Uuid,
    #[serde(flatten)]
    pub kind: CorrectionKind,

    // Snapshot of the live values at request time (never recomputed).
    pub current_start_time: Option<DateTime<Utc>>,
    pub current_end_time: Option<DateTime<Utc>>,
    pub current_reason: Option<String>,

    pub change_reason: String,
    pub status: ChangeRequestStatus,

    // Populated only on the transition out of `pending`.
    pub admin_comment: Option<String>,
    pub final_start_time: Option<DateTime<Utc>>,
    pub final_end_time: Option<DateTime<Utc>>,
    pub final_reason: Option<String>,
    pub final_date: Option<NaiveDate>,
    pub processed_at: Option<DateTime<Utc>>,
    pub processed_by: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChangeRequest {
    pub user_id: Uuid,
    pub time_entry_id: Uuid,
    pub kind: CorrectionKind,
    pub current_start_time: Option<DateTime<Utc>>,
    pub current_end_time: Option<DateTime<Utc>>,
    pub current_reason: Option<String>,
    pub change_reason: String,
}

/// Admin-side values recorded on a transition out of `pending`.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub admin_id: Uuid,
    pub comment: Option<String>,
    pub final_start_time: Option<DateTime<Utc>>,
    pub final_end_time: Option<DateTime<Utc>>,
    pub final_reason: Option<String>,
    pub final_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeRequestFilter {
    pub user_id: Option<Uuid>,
    pub pending_only: bool,
}
