use serde::Serialize;

use stechuhr_db::timesheet::models::TimeEntry;

#[derive(Debug, Serialize)]
pub struct ListEntriesResponse {
    pub data: Vec<TimeEntry>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CurrentEntryResponse {
    /// `None` when the user is not clocked in.
    pub entry: Option<TimeEntry>,
}
