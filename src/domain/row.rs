//! Rows read back from the emails table.

use serde::{Deserialize, Serialize};

use super::{RowId, Urgency};

/// Durable form of a classified message, one row per processed message.
///
/// Every column is free text; `urgency` is stored as text and parsed on
/// demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedEmailRow {
    pub id: RowId,
    pub sender: Option<String>,
    pub recipient: Option<String>,
    pub subject: Option<String>,
    pub gmail_id: Option<String>,
    pub replied: Option<String>,
    pub email_date: Option<String>,
    pub perm_type: Option<String>,
    pub urgency: Option<String>,
    pub known: Option<String>,
    pub alert: Option<String>,
    pub sender_type: Option<String>,
    pub sender_want: Option<String>,
}

impl PersistedEmailRow {
    /// Parsed urgency, if the stored text is a valid score.
    pub fn urgency_score(&self) -> Option<u8> {
        self.urgency.as_deref().and_then(|u| u.trim().parse().ok())
    }

    /// Sender type or an empty string.
    pub fn sender_type_str(&self) -> &str {
        self.sender_type.as_deref().unwrap_or("")
    }
}

impl Urgency for PersistedEmailRow {
    fn urgency(&self) -> u8 {
        self.urgency_score().unwrap_or(0)
    }
}
