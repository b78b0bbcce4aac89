use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use stechuhr_db::activity::models::{ActivityType, Direction, SourceSystem, UnifiedActivity};

use super::client::{WarehouseClient, WarehouseClientError};
use super::models::TicketRow;
use crate::preview::truncate_preview;

const PREVIEW_MAX_CHARS: usize = 200;
const QUERY_LIMIT: usize = 500;

pub struct WarehouseFetcher {
    client: WarehouseClient,
}

impl WarehouseFetcher {
    pub fn new(client: WarehouseClient) -> Self {
        Self { client }
    }

    /// Query tickets for the configured team since `cutoff` and map them to
    /// unified activities. Rows whose `created_at` cannot be parsed are
    /// skipped with a warning.
    pub async fn fetch(&self, cutoff: DateTime<Utc>) -> Result<Vec<UnifiedActivity>, WarehouseClientError> {
        let sql = build_ticket_query(self.client.team_name(), cutoff);
        let rows = self.client.query(&sql).await?;
        tracing::info!(count = rows.len(), "fetched warehouse tickets");

        let mut activities = Vec::with_capacity(rows.len());
        for row in rows {
            match map_ticket(&row) {
                Some(activity) => activities.push(activity),
                None => {
                    tracing::warn!(
                        ticket_id = row.id,
                        created_at = %row.created_at,
                        "ticket has unparsable created_at, skipping"
                    );
                }
            }
        }

        Ok(activities)
    }
}

fn build_ticket_query(team_name: &str, cutoff: DateTime<Utc>) -> String {
    // Team names come from our own config, but escape quotes anyway.
    let team = team_name.replace('\'', "''");
    format!(
        "select id, subject, created_at, requester_name, requester_email, \
         assignee_name, assignee_email, messages \
         from tickets \
         where team_name = '{team}' and created_at >= '{cutoff}' \
         order by created_at desc limit {QUERY_LIMIT}",
        cutoff = cutoff.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Parse the warehouse's free-form timestamp. Tries RFC 3339, then
/// `%Y-%m-%d %H:%M:%S`, then a bare date, all interpreted as UTC.
pub fn parse_warehouse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }

    None
}

/// Map one ticket row to a unified activity. Returns `None` when the
/// timestamp cannot be parsed; a guessed time is never written.
pub fn map_ticket(row: &TicketRow) -> Option<UnifiedActivity> {
    let timestamp = parse_warehouse_timestamp(&row.created_at)?;

    let preview = row
        .first_message_body()
        .or(row.subject.as_deref())
        .map(|s| truncate_preview(s, PREVIEW_MAX_CHARS));

    Some(UnifiedActivity {
        source_system: SourceSystem::TicketWarehouse,
        source_id: row.id.to_string(),
        activity_type: ActivityType::Ticket,
        direction: Some(Direction::Inbound),
        timestamp,
        duration_seconds: None,
        contact_name: row.requester_name.clone(),
        contact_email: row.requester_email.clone(),
        contact_phone: None,
        subject: row.subject.clone(),
        preview,
        user_name: row.assignee_name.clone(),
        user_email: row.assignee_email.clone(),
        raw_data: serde_json::to_value(row).unwrap_or(serde_json::Value::Null),
    })
}
