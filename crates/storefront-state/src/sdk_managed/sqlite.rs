use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    repository::{RepositoryItem, RepositoryItemData},
    sdk_managed::{Database, DatabaseConfiguration, DatabaseError},
};

// Table names come from `RepositoryItem::NAME`, which `register_repository_item!` restricts to
// letters and underscores, so interpolating them into SQL is safe. SQLite can't bind identifiers.
#[derive(Clone)]
pub(crate) struct SqliteDatabase(Arc<Mutex<rusqlite::Connection>>);

impl Database for SqliteDatabase {
    async fn initialize(
        configuration: DatabaseConfiguration,
        registrations: &[RepositoryItemData],
    ) -> Result<Self, DatabaseError> {
        let mut db = match configuration {
            DatabaseConfiguration::Sqlite { file_path } => {
                let db = rusqlite::Connection::open(file_path)?;
                // Set WAL mode for better concurrency
                db.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
                db
            }
            DatabaseConfiguration::InMemory => rusqlite::Connection::open_in_memory()?,
        };

        let transaction = db.transaction()?;

        for reg in registrations {
            transaction.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS {} (key TEXT PRIMARY KEY, value TEXT NOT NULL);",
                    reg.name()
                ),
                [],
            )?;
        }

        transaction.commit()?;
        Ok(SqliteDatabase(Arc::new(Mutex::new(db))))
    }

    async fn get<T: RepositoryItem>(&self, key: &str) -> Result<Option<T>, DatabaseError> {
        let conn = self.0.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT value FROM {} WHERE key = ?1", T::NAME))?;
        let mut rows = stmt.query(rusqlite::params![key])?;

        if let Some(row) = rows.next()? {
            let value = row.get::<_, String>(0)?;

            Ok(Some(serde_json::from_str(&value)?))
        } else {
            Ok(None)
        }
    }

    async fn list<T: RepositoryItem>(&self) -> Result<Vec<T>, DatabaseError> {
        let conn = self.0.lock().await;
        let mut stmt = conn.prepare(&format!("SELECT value FROM {}", T::NAME))?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut results = Vec::new();
        for row in rows {
            let value: String = row?;
            let value: T = serde_json::from_str(&value)?;
            results.push(value);
        }

        Ok(results)
    }

    async fn set<T: RepositoryItem>(&self, key: &str, value: T) -> Result<(), DatabaseError> {
        let mut conn = self.0.lock().await;
        let transaction = conn.transaction()?;

        let value = serde_json::to_string(&value)?;

        transaction.execute(
            &format!(
                "INSERT OR REPLACE INTO {} (key, value) VALUES (?1, ?2)",
                T::NAME
            ),
            rusqlite::params![key, value],
        )?;

        transaction.commit()?;
        Ok(())
    }

    async fn remove<T: RepositoryItem>(&self, key: &str) -> Result<(), DatabaseError> {
        let mut conn = self.0.lock().await;
        let transaction = conn.transaction()?;

        transaction.execute(
            &format!("DELETE FROM {} WHERE key = ?1", T::NAME),
            rusqlite::params![key],
        )?;

        transaction.commit()?;
        Ok(())
    }
}
