//! Vocabulary lists in `<namespace>extras`.
//!
//! Each stored value occupies its own row with only its list's column set.

use std::collections::HashSet;

use rusqlite::params;

use crate::domain::{Namespace, VocabularyList};
use crate::storage::database::{Database, Result};
use crate::storage::schema::{quote_ident, truncate_field, Table};

/// Non-null values of one list, in insertion order.
pub async fn fetch_vocabulary(
    db: &Database,
    ns: &Namespace,
    list: VocabularyList,
) -> Result<Vec<String>> {
    let column = quote_ident(list.column());
    let sql = format!(
        "SELECT {col} FROM {table} WHERE {col} IS NOT NULL ORDER BY id ASC",
        col = column,
        table = Table::Extras.ident(ns)
    );

    db.with_conn(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<Vec<String>>>()?)
    })
    .await
}

/// Appends the values not already stored in the list.
///
/// Matching is exact: no case folding or trimming. Duplicates inside the batch
/// are inserted once. Returns the number of rows written.
pub async fn append_vocabulary<I, S>(
    db: &Database,
    ns: &Namespace,
    list: VocabularyList,
    values: I,
) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let column = quote_ident(list.column());
    let table = Table::Extras.ident(ns);
    let select = format!("SELECT {col} FROM {table} WHERE {col} IS NOT NULL", col = column, table = table);
    let insert = format!("INSERT INTO {} ({}) VALUES (?1)", table, column);
    let values: Vec<String> = values.into_iter().map(|v| truncate_field(&v.into())).collect();

    let inserted = db
        .with_conn(move |conn| {
            let mut seen: HashSet<String> = {
                let mut stmt = conn.prepare(&select)?;
                let existing = stmt.query_map([], |row| row.get::<_, String>(0))?;
                existing.collect::<rusqlite::Result<_>>()?
            };

            let mut stmt = conn.prepare(&insert)?;
            let mut inserted = 0;
            for value in values {
                if seen.contains(&value) {
                    continue;
                }
                inserted += stmt.execute(params![value])?;
                seen.insert(value);
            }
            Ok(inserted)
        })
        .await?;

    if inserted > 0 {
        tracing::debug!(namespace = %ns, list = %list, inserted, "vocabulary extended");
    }
    Ok(inserted)
}

/// Seeds the starter want types, sender types and alert types.
///
/// Safe to call on every run: values already present are skipped.
pub async fn load_defaults(db: &Database, ns: &Namespace) -> Result<usize> {
    let mut inserted = 0;
    for list in VocabularyList::ALL {
        let defaults = list.defaults();
        if defaults.is_empty() {
            continue;
        }
        inserted += append_vocabulary(db, ns, list, defaults.iter().copied()).await?;
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Database, Namespace) {
        let db = Database::open_in_memory().await.unwrap();
        let ns = Namespace::new("v").unwrap();
        db.ensure_schema(&ns).await.unwrap();
        (db, ns)
    }

    #[tokio::test]
    async fn append_is_idempotent_across_calls() {
        let (db, ns) = setup().await;
        let list = VocabularyList::SenderTypes;

        let first = append_vocabulary(&db, &ns, list, ["Client", "Vendor"]).await.unwrap();
        let second = append_vocabulary(&db, &ns, list, ["Vendor", "Recruiter", "Client"])
            .await
            .unwrap();

        assert_eq!(first, 2);
        assert_eq!(second, 1);
        assert_eq!(
            fetch_vocabulary(&db, &ns, list).await.unwrap(),
            vec!["Client", "Vendor", "Recruiter"]
        );
    }

    #[tokio::test]
    async fn append_dedupes_within_batch() {
        let (db, ns) = setup().await;
        let inserted = append_vocabulary(&db, &ns, VocabularyList::AlertTypes, ["Billing", "Billing"])
            .await
            .unwrap();
        assert_eq!(inserted, 1);
    }

    #[tokio::test]
    async fn matching_is_exact() {
        let (db, ns) = setup().await;
        let list = VocabularyList::WantTypes;
        append_vocabulary(&db, &ns, list, ["new work"]).await.unwrap();
        append_vocabulary(&db, &ns, list, ["New Work", "new work "]).await.unwrap();

        assert_eq!(fetch_vocabulary(&db, &ns, list).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn lists_are_independent_columns() {
        let (db, ns) = setup().await;
        append_vocabulary(&db, &ns, VocabularyList::KnownAddresses, ["a@x.com"])
            .await
            .unwrap();
        append_vocabulary(&db, &ns, VocabularyList::SenderTypes, ["a@x.com"])
            .await
            .unwrap();

        assert_eq!(
            fetch_vocabulary(&db, &ns, VocabularyList::KnownAddresses).await.unwrap(),
            vec!["a@x.com"]
        );
        assert!(fetch_vocabulary(&db, &ns, VocabularyList::AlertTypes)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn load_defaults_seeds_once() {
        let (db, ns) = setup().await;

        let first = load_defaults(&db, &ns).await.unwrap();
        let second = load_defaults(&db, &ns).await.unwrap();

        assert_eq!(first, 12 + 7 + 3);
        assert_eq!(second, 0);
        let senders = fetch_vocabulary(&db, &ns, VocabularyList::SenderTypes).await.unwrap();
        assert_eq!(senders.first().map(String::as_str), Some("Client"));
    }
}
