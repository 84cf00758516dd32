//! Table definitions for a namespace.
//!
//! Table names are derived from a validated [`Namespace`] and always emitted
//! through [`quote_ident`]; column names come from the constants below. No
//! caller-provided text is ever spliced into SQL.

use rusqlite::Connection;

use crate::domain::Namespace;

/// Longest value stored in any text column.
pub const MAX_FIELD_LEN: usize = 255;

/// Persisted columns of the emails table, in insert order.
pub const EMAIL_COLUMNS: [&str; 12] = [
    "sender",
    "recipient",
    "subject",
    "gmail_id",
    "replied",
    "email_date",
    "perm_type",
    "urgency",
    "known",
    "alert",
    "sender_type",
    "sender_want",
];

/// The two tables kept per namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Emails,
    Extras,
}

impl Table {
    pub const ALL: [Table; 2] = [Table::Emails, Table::Extras];

    /// Unquoted table name within a namespace.
    pub fn name(self, ns: &Namespace) -> String {
        match self {
            Table::Emails => ns.emails_table(),
            Table::Extras => ns.extras_table(),
        }
    }

    /// Quoted table name, ready to splice into a statement.
    pub fn ident(self, ns: &Namespace) -> String {
        quote_ident(&self.name(ns))
    }
}

/// Quotes an SQL identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `CREATE TABLE` statement for the emails table.
pub fn create_emails(ns: &Namespace) -> String {
    let columns: Vec<String> = EMAIL_COLUMNS
        .iter()
        .map(|c| format!("    {} TEXT", quote_ident(c)))
        .collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    id INTEGER PRIMARY KEY AUTOINCREMENT,\n{}\n)",
        Table::Emails.ident(ns),
        columns.join(",\n")
    )
}

/// `CREATE TABLE` statement for the extras (vocabulary) table.
pub fn create_extras(ns: &Namespace) -> String {
    format!(
        r#"CREATE TABLE IF NOT EXISTS {} (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    "alerts_types" TEXT,
    "sender_types" TEXT,
    "known_addresses" TEXT,
    "want_types" TEXT
)"#,
        Table::Extras.ident(ns)
    )
}

/// Creates both tables if they are absent.
///
/// Existing tables are left alone, whatever their columns.
pub fn ensure(conn: &Connection, ns: &Namespace) -> rusqlite::Result<()> {
    conn.execute_batch(&create_emails(ns))?;
    conn.execute_batch(&create_extras(ns))?;
    Ok(())
}

/// Truncates a value to [`MAX_FIELD_LEN`] characters.
pub fn truncate_field(value: &str) -> String {
    match value.char_indices().nth(MAX_FIELD_LEN) {
        Some((cut, _)) => value[..cut].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(raw: &str) -> Namespace {
        Namespace::new(raw).unwrap()
    }

    #[test]
    fn quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("emails"), "\"emails\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn create_emails_uses_namespaced_table() {
        let sql = create_emails(&ns("alice"));
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"aliceemails\""));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        for column in EMAIL_COLUMNS {
            assert!(sql.contains(&format!("\"{}\" TEXT", column)));
        }
    }

    #[test]
    fn ensure_creates_both_tables_once() {
        let conn = Connection::open_in_memory().unwrap();
        let ns = ns("bob");

        ensure(&conn, &ns).unwrap();
        ensure(&conn, &ns).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' AND name LIKE 'bob%' ORDER BY name")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(names, vec!["bobemails", "bobextras"]);
    }

    #[test]
    fn namespaces_do_not_collide() {
        let conn = Connection::open_in_memory().unwrap();
        ensure(&conn, &ns("a")).unwrap();
        ensure(&conn, &ns("b")).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name LIKE '%emails'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn truncate_field_counts_characters() {
        let long = "é".repeat(MAX_FIELD_LEN + 10);
        let cut = truncate_field(&long);
        assert_eq!(cut.chars().count(), MAX_FIELD_LEN);
        assert_eq!(truncate_field("short"), "short");
    }
}
