use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub rows: Vec<TicketRow>,
}

/// One row from the warehouse's ticket table. `created_at` arrives as a
/// free-form string and is parsed by the fetcher; `messages` is the raw
/// conversation blob and is only probed for a preview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketRow {
    pub id: i64,
    pub subject: Option<String>,
    pub created_at: String,
    pub requester_name: Option<String>,
    pub requester_email: Option<String>,
    pub assignee_name: Option<String>,
    pub assignee_email: Option<String>,
    #[serde(default)]
    pub messages: serde_json::Value,
}

impl TicketRow {
    /// Body of the first message in the conversation blob, if any.
    pub fn first_message_body(&self) -> Option<&str> {
        self.messages
            .as_array()?
            .first()?
            .get("body")?
            .as_str()
    }
}
