use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRef {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageListPage {
    #[serde(default)]
    pub messages: Vec<MessageRef>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessagePayload {
    #[serde(default)]
    pub headers: Vec<MessageHeader>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailMessage {
    pub id: String,
    pub snippet: Option<String>,
    #[serde(default)]
    pub payload: MessagePayload,
}

impl MailMessage {
    /// Header lookup by name, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.payload
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let msg: MailMessage = serde_json::from_value(serde_json::json!({
            "id": "m-1",
            "snippet": "hi",
            "payload": {
                "headers": [
                    { "name": "Date", "value": "Tue, 14 Nov 2023 23:13:20 +0100" },
                    { "name": "Subject", "value": "Re: Angebot" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(msg.header("date"), Some("Tue, 14 Nov 2023 23:13:20 +0100"));
        assert_eq!(msg.header("SUBJECT"), Some("Re: Angebot"));
        assert_eq!(msg.header("To"), None);
    }

    #[test]
    fn list_page_tolerates_missing_messages() {
        let page: MessageListPage = serde_json::from_str("{}").unwrap();
        assert!(page.messages.is_empty());
        assert!(page.next_page_token.is_none());
    }
}
