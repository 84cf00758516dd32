//! Mailbox archive reader.
//!
//! Turns an exported mbox file into [`MessageRecord`]s. The archive is split
//! with mail-parser's mbox iterator and each message is parsed with
//! mailparse, which gives direct access to MIME parts and their declared
//! charsets.

mod body;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mail_parser::mailbox::mbox::MessageIterator;
use mailparse::{MailHeaderMap, ParsedMail};
use thiserror::Error;

use crate::domain::MessageRecord;

pub use body::{decode_text, extract_body};

/// Errors raised while reading an archive.
#[derive(Debug, Error)]
pub enum MailboxError {
    #[error("failed to open mailbox: {0}")]
    Io(#[from] std::io::Error),

    #[error("message {index} in the archive could not be split out")]
    Malformed { index: usize },

    #[error("message {index} could not be parsed: {source}")]
    Parse {
        index: usize,
        #[source]
        source: mailparse::MailParseError,
    },
}

/// Result type for mailbox operations.
pub type Result<T> = std::result::Result<T, MailboxError>;

/// Reads every message in the archive, preserving archive order.
///
/// The whole archive is materialized before returning.
pub fn read_mailbox(path: impl AsRef<Path>) -> Result<Vec<MessageRecord>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();
    for (index, raw) in MessageIterator::new(reader).enumerate() {
        let raw = raw.map_err(|_| MailboxError::Malformed { index })?;
        let record = parse_message(raw.contents())
            .map_err(|source| MailboxError::Parse { index, source })?;
        records.push(record);
    }

    tracing::info!(path = %path.display(), messages = records.len(), "mailbox read");
    Ok(records)
}

/// Parses one RFC 5322 message into a record.
pub fn parse_message(raw: &[u8]) -> std::result::Result<MessageRecord, mailparse::MailParseError> {
    let parsed = mailparse::parse_mail(raw)?;
    Ok(record_from(&parsed))
}

fn record_from(parsed: &ParsedMail<'_>) -> MessageRecord {
    let header = |name: &str| parsed.headers.get_first_value(name);

    MessageRecord {
        sender: header("From").unwrap_or_default(),
        recipient: header("To").unwrap_or_default(),
        subject: header("Subject").unwrap_or_default(),
        message_id: header("Message-ID").unwrap_or_default(),
        in_reply_to: header("In-Reply-To"),
        date: header("Date").unwrap_or_default(),
        perm_type: String::new(),
        body: extract_body(parsed),
    }
}
