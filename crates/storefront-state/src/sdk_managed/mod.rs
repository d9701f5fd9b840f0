use std::sync::Arc;

use thiserror::Error;

use crate::{
    SettingItem,
    repository::{Repository, RepositoryError, RepositoryItem, RepositoryItemData},
};

mod configuration;
pub use configuration::DatabaseConfiguration;

mod sqlite;
type SystemDatabase = sqlite::SqliteDatabase;

/// Errors raised by the SDK-managed database.
#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Internal(#[from] rusqlite::Error),
}

pub(crate) trait Database {
    async fn initialize(
        configuration: DatabaseConfiguration,
        registrations: &[RepositoryItemData],
    ) -> Result<Self, DatabaseError>
    where
        Self: Sized;

    async fn get<T: RepositoryItem>(&self, key: &str) -> Result<Option<T>, DatabaseError>;

    async fn list<T: RepositoryItem>(&self) -> Result<Vec<T>, DatabaseError>;

    async fn set<T: RepositoryItem>(&self, key: &str, value: T) -> Result<(), DatabaseError>;

    async fn remove<T: RepositoryItem>(&self, key: &str) -> Result<(), DatabaseError>;
}

struct DBRepository<T: RepositoryItem> {
    database: SystemDatabase,
    _marker: std::marker::PhantomData<T>,
}

#[async_trait::async_trait]
impl<V: RepositoryItem> Repository<V> for DBRepository<V> {
    async fn get(&self, key: String) -> Result<Option<V>, RepositoryError> {
        let value = self.database.get::<V>(&key).await?;
        Ok(value)
    }
    async fn list(&self) -> Result<Vec<V>, RepositoryError> {
        let values = self.database.list::<V>().await?;
        Ok(values)
    }
    async fn set(&self, key: String, value: V) -> Result<(), RepositoryError> {
        Ok(self.database.set::<V>(&key, value).await?)
    }
    async fn remove(&self, key: String) -> Result<(), RepositoryError> {
        Ok(self.database.remove::<V>(&key).await?)
    }
}

/// State storage owned by the SDK, backed by SQLite.
#[derive(Clone)]
pub struct SdkManagedState {
    database: SystemDatabase,
}

impl std::fmt::Debug for SdkManagedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkManagedState").finish_non_exhaustive()
    }
}

impl SdkManagedState {
    /// Open (or create) the database described by `configuration`.
    pub async fn initialize(configuration: DatabaseConfiguration) -> Result<Self, DatabaseError> {
        let database =
            SystemDatabase::initialize(configuration, &[RepositoryItemData::new::<SettingItem>()])
                .await?;
        Ok(Self { database })
    }

    /// Repository backing the [`Setting`](crate::Setting) handles.
    pub fn settings(&self) -> Arc<dyn Repository<SettingItem>> {
        Arc::new(DBRepository {
            database: self.database.clone(),
            _marker: std::marker::PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_settings_round_trip_and_remove() {
        let state = SdkManagedState::initialize(DatabaseConfiguration::InMemory)
            .await
            .unwrap();
        let repository = state.settings();

        assert_eq!(repository.get("cart".to_string()).await.unwrap(), None);

        let item = SettingItem(serde_json::json!([{"item_id": "7"}]));
        repository
            .set("cart".to_string(), item.clone())
            .await
            .unwrap();
        repository
            .set("cart".to_string(), item.clone())
            .await
            .unwrap();

        assert_eq!(
            repository.get("cart".to_string()).await.unwrap(),
            Some(item.clone())
        );
        assert_eq!(repository.list().await.unwrap(), vec![item]);

        repository.remove("cart".to_string()).await.unwrap();
        assert_eq!(repository.get("cart".to_string()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_backed_state_survives_reopen() {
        let path = std::env::temp_dir().join(format!(
            "storefront-state-test-{}.sqlite",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        {
            let state = SdkManagedState::initialize(DatabaseConfiguration::Sqlite {
                file_path: path.clone(),
            })
            .await
            .unwrap();
            state
                .settings()
                .set(
                    "access_token".to_string(),
                    SettingItem(serde_json::json!("token")),
                )
                .await
                .unwrap();
        }

        let reopened = SdkManagedState::initialize(DatabaseConfiguration::Sqlite {
            file_path: path.clone(),
        })
        .await
        .unwrap();
        assert_eq!(
            reopened
                .settings()
                .get("access_token".to_string())
                .await
                .unwrap(),
            Some(SettingItem(serde_json::json!("token")))
        );

        drop(reopened);
        let _ = std::fs::remove_file(&path);
    }
}
