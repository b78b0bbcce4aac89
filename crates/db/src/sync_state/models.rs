use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::models::SourceSystem;

/// Rolling per-source sync bookkeeping. One row per source exists up front;
/// the application only ever updates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub source_system: SourceSystem,
    pub last_sync_timestamp: Option<DateTime<Utc>>,
    pub last_successful_sync: Option<DateTime<Utc>>,
    pub sync_status: String,
    pub error_message: Option<String>,
}
