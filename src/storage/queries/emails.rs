//! Classified message rows.
//!
//! Inserts and reads against `<namespace>emails`. Message bodies are never
//! written; only header metadata and classification output are kept.

use rusqlite::{params, params_from_iter, Row};

use crate::domain::{ClassifiedEmail, Namespace, PersistedEmailRow, RowId};
use crate::storage::database::{Database, DatabaseError, Result};
use crate::storage::schema::{quote_ident, truncate_field, Table, EMAIL_COLUMNS};

/// How many rows permanent-tag inference looks at.
pub const RECENT_WINDOW: usize = 3;

/// Column values for one classified message, in [`EMAIL_COLUMNS`] order.
///
/// Present values are truncated; absent values bind as NULL.
pub fn row_values(email: &ClassifiedEmail) -> Vec<Option<String>> {
    let record = &email.record;
    let class = &email.classification;

    let known = if email.known { "True" } else { "False" };
    let urgency = class.urgency.to_string();

    [
        Some(record.sender.as_str()),
        Some(record.recipient.as_str()),
        Some(record.subject.as_str()),
        Some(record.message_id.as_str()),
        record.in_reply_to.as_deref(),
        Some(record.date.as_str()),
        Some(record.perm_type.as_str()),
        Some(urgency.as_str()),
        Some(known),
        Some(class.alert.as_str()),
        Some(class.sender_type.as_str()),
        Some(class.sender_want.as_str()),
    ]
    .into_iter()
    .map(|value| value.map(truncate_field))
    .collect()
}

fn insert_sql(ns: &Namespace) -> String {
    let columns: Vec<String> = EMAIL_COLUMNS.iter().map(|c| quote_ident(c)).collect();
    let placeholders: Vec<String> = (1..=EMAIL_COLUMNS.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        Table::Emails.ident(ns),
        columns.join(", "),
        placeholders.join(", ")
    )
}

fn select_sql(ns: &Namespace) -> String {
    let columns: Vec<String> = EMAIL_COLUMNS.iter().map(|c| quote_ident(c)).collect();
    format!(
        "SELECT id, {} FROM {}",
        columns.join(", "),
        Table::Emails.ident(ns)
    )
}

/// Inserts one row per message and returns how many were written.
///
/// Each insert commits on its own; there is no enclosing transaction. A
/// failing row stops the batch with [`DatabaseError::PartialInsert`], which
/// carries how many earlier rows were already committed.
pub async fn insert_records(
    db: &Database,
    ns: &Namespace,
    emails: &[ClassifiedEmail],
) -> Result<usize> {
    let sql = insert_sql(ns);
    let rows: Vec<Vec<Option<String>>> = emails.iter().map(row_values).collect();

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let mut inserted = 0;
        for values in &rows {
            match stmt.execute(params_from_iter(values.iter())) {
                Ok(n) => inserted += n,
                Err(source) => return Err(DatabaseError::PartialInsert { inserted, source }),
            }
        }
        Ok(inserted)
    })
    .await
}

/// Most recent rows for an exact sender match, newest first.
pub async fn recent_by_sender(
    db: &Database,
    ns: &Namespace,
    sender: &str,
    limit: usize,
) -> Result<Vec<PersistedEmailRow>> {
    let sql = format!("{} WHERE sender = ?1 ORDER BY id DESC LIMIT ?2", select_sql(ns));
    let sender = sender.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![sender, limit], row_to_email)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
    .await
}

/// Every row in insertion order.
pub async fn list_all(db: &Database, ns: &Namespace) -> Result<Vec<PersistedEmailRow>> {
    let sql = format!("{} ORDER BY id ASC", select_sql(ns));

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_email)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    })
    .await
}

/// Number of stored rows.
pub async fn count(db: &Database, ns: &Namespace) -> Result<u64> {
    let sql = format!("SELECT COUNT(*) FROM {}", Table::Emails.ident(ns));
    db.with_conn(move |conn| Ok(conn.query_row(&sql, [], |row| row.get(0))?))
        .await
}

fn row_to_email(row: &Row) -> rusqlite::Result<PersistedEmailRow> {
    Ok(PersistedEmailRow {
        id: RowId(row.get(0)?),
        sender: row.get(1)?,
        recipient: row.get(2)?,
        subject: row.get(3)?,
        gmail_id: row.get(4)?,
        replied: row.get(5)?,
        email_date: row.get(6)?,
        perm_type: row.get(7)?,
        urgency: row.get(8)?,
        known: row.get(9)?,
        alert: row.get(10)?,
        sender_type: row.get(11)?,
        sender_want: row.get(12)?,
    })
}
