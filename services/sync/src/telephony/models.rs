use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct CallsPage {
    #[serde(default)]
    pub calls: Vec<CallRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl CallContact {
    /// First and last name joined and trimmed; `None` when both are blank.
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let name = format!("{first} {last}");
        let name = name.trim();
        (!name.is_empty()).then(|| name.to_string())
    }
}

/// One call record from the telephony provider. `started_at` is Unix
/// seconds; `line_number` is the company-side line, `phone_number` the
/// external party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    pub id: String,
    pub direction: Option<String>,
    pub started_at: i64,
    pub duration_seconds: Option<i32>,
    pub line_number: Option<String>,
    pub phone_number: Option<String>,
    pub contact: Option<CallContact>,
}
