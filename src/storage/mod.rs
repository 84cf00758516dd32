//! Database and credential storage.
//!
//! - SQLite tables for classified messages and vocabulary lists, two per
//!   namespace
//! - OS keychain integration for the model API key
//! - Async-safe database operations via tokio::task::spawn_blocking

mod database;
mod keychain;
pub mod queries;
pub mod schema;

pub use database::{Database, DatabaseError, Result};
pub use keychain::{KeychainAccess, KeychainError};
pub use schema::Table;

use std::sync::Arc;

/// Database plus keychain, the storage entry point used by the binary.
#[derive(Debug, Clone)]
pub struct StorageLayer {
    db: Database,
    keychain: KeychainAccess,
}

impl StorageLayer {
    /// Opens the database file and the default keychain service.
    pub async fn new(db_path: impl AsRef<std::path::Path>) -> Result<Self> {
        let db = Database::open(db_path).await?;
        Ok(Self {
            db,
            keychain: KeychainAccess::new(),
        })
    }

    /// In-memory database with a test keychain service.
    pub async fn in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db,
            keychain: KeychainAccess::with_service("io.inbox-triage.test"),
        })
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn keychain(&self) -> &KeychainAccess {
        &self.keychain
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Namespace;

    #[tokio::test]
    async fn storage_layer_in_memory() {
        let storage = StorageLayer::in_memory().await.unwrap();
        let ns = Namespace::new("s").unwrap();
        storage.db().ensure_schema(&ns).await.unwrap();

        let rows = queries::emails::count(storage.db(), &ns).await.unwrap();
        assert_eq!(rows, 0);
    }

    #[tokio::test]
    async fn storage_layer_keychain_service() {
        let storage = StorageLayer::in_memory().await.unwrap();
        assert_eq!(storage.keychain().service_name(), "io.inbox-triage.test");
    }

    #[tokio::test]
    async fn storage_layer_into_arc_shares_database() {
        let storage = StorageLayer::in_memory().await.unwrap().into_arc();
        let ns = Namespace::new("arc").unwrap();
        storage.db().ensure_schema(&ns).await.unwrap();

        let clone = Arc::clone(&storage);
        assert!(queries::tables::exists(clone.db(), &ns, Table::Emails)
            .await
            .unwrap());
    }
}
