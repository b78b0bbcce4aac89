use chrono::{DateTime, Utc};

use stechuhr_db::activity::models::{ActivityType, Direction, SourceSystem, UnifiedActivity};

use super::client::{TelephonyClient, TelephonyClientError};
use super::models::CallRecord;

pub struct TelephonyFetcher {
    client: TelephonyClient,
}

impl TelephonyFetcher {
    pub fn new(client: TelephonyClient) -> Self {
        Self { client }
    }

    /// Fetch calls since `cutoff`, keep only those on an allow-listed line,
    /// and map them to unified activities.
    pub async fn fetch(&self, cutoff: DateTime<Utc>) -> Result<Vec<UnifiedActivity>, TelephonyClientError> {
        let calls = self.client.fetch_calls_since(cutoff).await?;
        let total = calls.len();

        let activities: Vec<UnifiedActivity> = calls
            .iter()
            .filter(|call| is_allowed(call, self.client.allowed_numbers()))
            .map(map_call)
            .collect();

        tracing::info!(
            total,
            kept = activities.len(),
            "filtered telephony calls against allow-list"
        );

        Ok(activities)
    }
}

/// Strip everything that is not an ASCII digit.
pub fn normalize_number(number: &str) -> String {
    number.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A call is kept iff any allow-listed number, digit-normalized, is a
/// substring of the call line's normalized digits.
pub fn is_allowed(call: &CallRecord, allowed: &[String]) -> bool {
    let line = match &call.line_number {
        Some(n) => normalize_number(n),
        None => return false,
    };
    if line.is_empty() {
        return false;
    }

    allowed.iter().any(|candidate| {
        let normalized = normalize_number(candidate);
        !normalized.is_empty() && line.contains(&normalized)
    })
}

pub fn map_call(call: &CallRecord) -> UnifiedActivity {
    let direction = call
        .direction
        .as_deref()
        .and_then(|d| d.parse::<Direction>().ok());

    UnifiedActivity {
        source_system: SourceSystem::Telephony,
        source_id: call.id.clone(),
        activity_type: ActivityType::Call,
        direction,
        timestamp: DateTime::from_timestamp(call.started_at, 0).unwrap_or_default(),
        duration_seconds: call.duration_seconds,
        contact_name: call.contact.as_ref().and_then(|c| c.full_name()),
        contact_email: None,
        contact_phone: call.phone_number.as_deref().map(normalize_number),
        subject: None,
        preview: None,
        user_name: None,
        user_email: None,
        raw_data: serde_json::to_value(call).unwrap_or(serde_json::Value::Null),
    }
}
