//! Plain-text rendering of stored data for the terminal.

use std::fmt::Write;

use crate::domain::{PersistedEmailRow, VocabularyList};
use crate::services::RunSummary;

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// One line per row with the classification fields up front.
pub fn email_rows(rows: &[PersistedEmailRow]) -> String {
    if rows.is_empty() {
        return "No stored emails.\n".to_string();
    }

    let mut out = String::new();
    for row in rows {
        let _ = writeln!(
            out,
            "#{id} [{urgency:>3}] {sender} | {subject} | type: {sender_type} | want: {want} | alert: {alert} | perm: {perm} | known: {known} | {date}",
            id = row.id,
            urgency = cell(&row.urgency),
            sender = cell(&row.sender),
            subject = cell(&row.subject),
            sender_type = cell(&row.sender_type),
            want = cell(&row.sender_want),
            alert = cell(&row.alert),
            perm = row.perm_type.as_deref().filter(|p| !p.is_empty()).unwrap_or("-"),
            known = cell(&row.known),
            date = cell(&row.email_date),
        );
    }
    out
}

/// A titled, comma-separated vocabulary list.
pub fn vocabulary(list: VocabularyList, values: &[String]) -> String {
    let body = if values.is_empty() {
        "(empty)".to_string()
    } else {
        values.join(", ")
    };
    format!("{}: {}\n", list, body)
}

pub fn summary(summary: &RunSummary) -> String {
    format!(
        "Processed {classified} of {read} messages from {path}: {inserted} rows stored, {vocab} new vocabulary entries, {known} known senders ({secs}s).\n",
        classified = summary.classified,
        read = summary.messages_read,
        path = summary.mailbox.display(),
        inserted = summary.inserted,
        vocab = summary.vocabulary_added,
        known = summary.known_senders,
        secs = summary.elapsed().num_seconds(),
    )
}
