use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SourceSystem {
    Mail,
    TicketWarehouse,
    Telephony,
}

impl SourceSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::TicketWarehouse => "ticket_warehouse",
            Self::Telephony => "telephony",
        }
    }

    pub const ALL: [Self; 3] = [Self::Mail, Self::TicketWarehouse, Self::Telephony];
}

impl FromStr for SourceSystem {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "mail" => Ok(Self::Mail),
            "ticket_warehouse" => Ok(Self::TicketWarehouse),
            "telephony" => Ok(Self::Telephony),
            _ => Err(format!("unknown source system: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Email,
    Ticket,
    Call,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Ticket => "ticket",
            Self::Call => "call",
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "email" => Ok(Self::Email),
            "ticket" => Ok(Self::Ticket),
            "call" => Ok(Self::Call),
            _ => Err(format!("unknown activity type: {value}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            _ => Err(format!("unknown direction: {value}")),
        }
    }
}

/// One normalized record for an email, a ticket message, or a phone call.
/// Keyed by `(source_system, source_id)`; a re-sync overwrites every other
/// field in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnifiedActivity {
    pub source_system: SourceSystem,
    pub source_id: String,
    pub activity_type: ActivityType,
    pub direction: Option<Direction>,
    pub timestamp: DateTime<Utc>,
    pub duration_seconds: Option<i32>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub subject: Option<String>,
    pub preview: Option<String>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub raw_data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ActivityFilter {
    pub source: Option<SourceSystem>,
    pub limit: Option<i64>,
}
