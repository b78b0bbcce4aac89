use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
pub struct ActivitiesQuery {
    /// `mail`, `ticket_warehouse`, or `telephony`.
    pub source: Option<String>,
    pub limit: Option<i64>,
}
