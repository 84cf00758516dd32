//! Administrative table operations.

use crate::domain::Namespace;
use crate::storage::database::{Database, Result};
use crate::storage::schema::Table;

/// Drops one of the namespace's tables if it exists.
pub async fn drop_table(db: &Database, ns: &Namespace, table: Table) -> Result<()> {
    let sql = format!("DROP TABLE IF EXISTS {}", table.ident(ns));
    let name = table.name(ns);

    db.with_conn(move |conn| {
        conn.execute_batch(&sql)?;
        tracing::info!(table = %name, "table dropped");
        Ok(())
    })
    .await
}

/// Drops both tables of the namespace.
pub async fn drop_all(db: &Database, ns: &Namespace) -> Result<()> {
    for table in Table::ALL {
        drop_table(db, ns, table).await?;
    }
    Ok(())
}

/// Whether a table currently exists.
pub async fn exists(db: &Database, ns: &Namespace, table: Table) -> Result<bool> {
    let name = table.name(ns);
    db.with_conn(move |conn| {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [&name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    })
    .await
}
