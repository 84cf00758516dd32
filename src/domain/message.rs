//! Message records read from a mailbox archive.

use serde::{Deserialize, Serialize};

/// One message from the archive, with the header fields the classifier and
/// the store care about.
///
/// Absent headers are stored as empty strings, except `In-Reply-To` which is
/// kept optional so it persists as NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// `From` header; normalized to a bare address before classification.
    pub sender: String,
    /// `To` header.
    pub recipient: String,
    /// `Subject` header.
    pub subject: String,
    /// `Message-ID` header.
    pub message_id: String,
    /// `In-Reply-To` header.
    pub in_reply_to: Option<String>,
    /// `Date` header, verbatim.
    pub date: String,
    /// Permanent sender type, empty until inferred.
    pub perm_type: String,
    /// Decoded plain-text body. Never persisted.
    pub body: String,
}

impl MessageRecord {
    /// Creates a record with just a sender and body.
    pub fn new(sender: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            body: body.into(),
            ..Default::default()
        }
    }

    /// Sets the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Sets the message id.
    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    /// Sets the message id this record replies to.
    pub fn with_in_reply_to(mut self, in_reply_to: impl Into<String>) -> Self {
        self.in_reply_to = Some(in_reply_to.into());
        self
    }

    /// Whether a permanent sender type has already been assigned.
    pub fn has_perm_type(&self) -> bool {
        !self.perm_type.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let record = MessageRecord::new("a@b.com", "hello")
            .with_subject("Hi")
            .with_message_id("<1@b.com>")
            .with_in_reply_to("<0@b.com>");

        assert_eq!(record.sender, "a@b.com");
        assert_eq!(record.subject, "Hi");
        assert_eq!(record.message_id, "<1@b.com>");
        assert_eq!(record.in_reply_to.as_deref(), Some("<0@b.com>"));
        assert!(record.recipient.is_empty());
    }

    #[test]
    fn perm_type_starts_empty() {
        let mut record = MessageRecord::default();
        assert!(!record.has_perm_type());

        record.perm_type = "Client".to_string();
        assert!(record.has_perm_type());
    }
}
