use chrono::{DateTime, Utc};

use stechuhr_db::activity::models::{ActivityType, Direction, SourceSystem, UnifiedActivity};

use super::client::{MailClient, MailClientError};
use super::models::MailMessage;
use crate::preview::truncate_preview;

const PREVIEW_MAX_CHARS: usize = 200;

pub struct MailFetcher {
    client: MailClient,
}

impl MailFetcher {
    pub fn new(client: MailClient) -> Self {
        Self { client }
    }

    /// Fetch sent messages from every configured mailbox since `cutoff` and
    /// map them to unified activities. A message without a parsable `Date`
    /// header is skipped with a warning rather than written with a guessed
    /// time.
    pub async fn fetch(&self, cutoff: DateTime<Utc>) -> Result<Vec<UnifiedActivity>, MailClientError> {
        let mut activities = Vec::new();

        for account in self.client.accounts().to_vec() {
            let ids = self.client.list_sent_message_ids(&account, cutoff).await?;
            tracing::info!(account = %account, count = ids.len(), "listed sent messages");

            for id in ids {
                let message = self.client.fetch_message(&account, &id).await?;
                match map_message(&account, &message) {
                    Some(activity) => activities.push(activity),
                    None => {
                        tracing::warn!(
                            account = %account,
                            message_id = %id,
                            "message has no parsable Date header, skipping"
                        );
                    }
                }
            }
        }

        Ok(activities)
    }
}

/// Map one mail message to a unified activity. Returns `None` when the
/// `Date` header is missing or not valid RFC 2822.
pub fn map_message(account: &str, message: &MailMessage) -> Option<UnifiedActivity> {
    let timestamp = message
        .header("Date")
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())?
        .with_timezone(&Utc);

    let (contact_name, contact_email) = message.header("To").map(split_address).unwrap_or((None, None));

    Some(UnifiedActivity {
        source_system: SourceSystem::Mail,
        source_id: message.id.clone(),
        activity_type: ActivityType::Email,
        direction: Some(Direction::Outbound),
        timestamp,
        duration_seconds: None,
        contact_name,
        contact_email,
        contact_phone: None,
        subject: message.header("Subject").map(str::to_string),
        preview: message
            .snippet
            .as_deref()
            .map(|s| truncate_preview(s, PREVIEW_MAX_CHARS)),
        user_name: None,
        user_email: Some(account.to_string()),
        raw_data: serde_json::to_value(message).unwrap_or(serde_json::Value::Null),
    })
}

/// Split an RFC 2822 address like `"Lisa Bayer" <lisa@example.com>` into
/// display name and address. A bare address yields `(None, Some(addr))`.
fn split_address(value: &str) -> (Option<String>, Option<String>) {
    match (value.find('<'), value.rfind('>')) {
        (Some(open), Some(close)) if open < close => {
            let name = value[..open].trim().trim_matches('"').trim();
            let addr = value[open + 1..close].trim();
            (
                (!name.is_empty()).then(|| name.to_string()),
                (!addr.is_empty()).then(|| addr.to_string()),
            )
        }
        _ => {
            let addr = value.trim();
            (None, (!addr.is_empty()).then(|| addr.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(headers: &[(&str, &str)], snippet: Option<&str>) -> MailMessage {
        serde_json::from_value(serde_json::json!({
            "id": "msg-1",
            "snippet": snippet,
            "payload": {
                "headers": headers
                    .iter()
                    .map(|(n, v)| serde_json::json!({ "name": n, "value": v }))
                    .collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    #[test]
    fn maps_rfc2822_date_to_utc() {
        let msg = message(
            &[
                ("Date", "Tue, 14 Nov 2023 23:13:20 +0100"),
                ("Subject", "Angebot"),
                ("To", "kunde@example.com"),
            ],
            Some("Sehr geehrter Herr ..."),
        );

        let activity = map_message("team@example.com", &msg).unwrap();
        assert_eq!(activity.timestamp.to_rfc3339(), "2023-11-14T22:13:20+00:00");
        assert_eq!(activity.source_system, SourceSystem::Mail);
        assert_eq!(activity.activity_type, ActivityType::Email);
        assert_eq!(activity.direction, Some(Direction::Outbound));
        assert_eq!(activity.subject.as_deref(), Some("Angebot"));
        assert_eq!(activity.contact_email.as_deref(), Some("kunde@example.com"));
        assert_eq!(activity.user_email.as_deref(), Some("team@example.com"));
    }

    #[test]
    fn missing_date_header_is_skipped() {
        let msg = message(&[("Subject", "kein Datum")], None);
        assert!(map_message("team@example.com", &msg).is_none());
    }

    #[test]
    fn unparsable_date_header_is_skipped() {
        let msg = message(&[("Date", "gestern irgendwann")], None);
        assert!(map_message("team@example.com", &msg).is_none());
    }

    #[test]
    fn snippet_is_truncated_to_preview_limit() {
        let long = "a".repeat(500);
        let msg = message(&[("Date", "Tue, 14 Nov 2023 10:00:00 +0000")], Some(&long));

        let activity = map_message("team@example.com", &msg).unwrap();
        assert_eq!(activity.preview.unwrap().chars().count(), 200);
    }

    #[test]
    fn splits_display_name_from_address() {
        let msg = message(
            &[
                ("Date", "Tue, 14 Nov 2023 10:00:00 +0000"),
                ("To", "\"Lisa Bayer\" <lisa@example.com>"),
            ],
            None,
        );

        let activity = map_message("team@example.com", &msg).unwrap();
        assert_eq!(activity.contact_name.as_deref(), Some("Lisa Bayer"));
        assert_eq!(activity.contact_email.as_deref(), Some("lisa@example.com"));
    }
}
