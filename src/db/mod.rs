pub mod models;

use std::{collections::BTreeMap, marker::PhantomData, path::Path, str::FromStr, time::Duration};

use serde::{de::DeserializeOwned, Serialize};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use thiserror::Error;

use crate::configuration::{StoreMode, StoreSettings};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Value encoding error")]
    EncodingError(#[from] serde_json::Error),
}

/// Named key-value maps persisted in SQLite. Cloning shares the pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub async fn new(settings: &StoreSettings) -> Result<Self, StoreError> {
        match settings.mode {
            StoreMode::Online => Self::online(&settings.path).await,
            StoreMode::Offline => Self::offline().await,
        }
    }

    pub async fn online(path: &Path) -> Result<Self, StoreError> {
        tracing::info!("Opening store at {}", path.display());
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    /// In-memory store. Every connection to `:memory:` is its own database, so the pool
    /// holds exactly one connection that never expires.
    pub async fn offline() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Store { pool })
    }

    /// Handle to the map called `name`. Maps spring into existence on first write.
    pub fn map<V>(&self, name: &str) -> StoreMap<V>
    where
        V: Serialize + DeserializeOwned,
    {
        StoreMap {
            pool: self.pool.clone(),
            name: name.to_owned(),
            _value: PhantomData,
        }
    }

    pub async fn map_names(&self) -> Result<Vec<String>, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT DISTINCT map FROM entries ORDER BY map ASC")
                .fetch_all(&self.pool)
                .await?,
        )
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM entries")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Every map as `{ map: { key: value } }`.
    pub async fn export(&self) -> Result<serde_json::Value, StoreError> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT map, key, value FROM entries ORDER BY map ASC, rowid ASC")
                .fetch_all(&self.pool)
                .await?;

        let mut maps: BTreeMap<String, serde_json::Map<String, serde_json::Value>> =
            BTreeMap::new();
        for (map, key, value) in rows {
            maps.entry(map)
                .or_default()
                .insert(key, serde_json::from_str(&value)?);
        }
        Ok(serde_json::to_value(maps)?)
    }
}

pub struct StoreMap<V> {
    pool: SqlitePool,
    name: String,
    _value: PhantomData<fn() -> V>,
}

impl<V> Clone for StoreMap<V> {
    fn clone(&self) -> Self {
        StoreMap {
            pool: self.pool.clone(),
            name: self.name.clone(),
            _value: PhantomData,
        }
    }
}

impl<V> StoreMap<V>
where
    V: Serialize + DeserializeOwned,
{
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(
            sqlx::query_scalar("SELECT value FROM entries WHERE map = ? AND key = ?")
                .bind(&self.name)
                .bind(key)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    pub async fn get(&self, key: &str) -> Result<Option<V>, StoreError> {
        Ok(self
            .raw(key)
            .await?
            .map(|raw| serde_json::from_str(&raw))
            .transpose()?)
    }

    pub async fn contains_key(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.raw(key).await?.is_some())
    }

    pub async fn insert(&self, key: &str, value: &V) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO entries (map, key, value) VALUES (?, ?, ?)
            ON CONFLICT (map, key) DO UPDATE SET value = excluded.value
            "#,
        )
        .bind(&self.name)
        .bind(key)
        .bind(serde_json::to_string(value)?)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Returns whether the key was present.
    pub async fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM entries WHERE map = ? AND key = ?")
            .bind(&self.name)
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn len(&self) -> Result<usize, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries WHERE map = ?")
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count as usize)
    }

    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len().await? == 0)
    }

    /// Entries in first-insertion order.
    pub async fn entries(&self) -> Result<Vec<(String, V)>, StoreError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM entries WHERE map = ? ORDER BY rowid ASC")
                .bind(&self.name)
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter()
            .map(|(key, raw)| -> Result<(String, V), StoreError> {
                Ok((key, serde_json::from_str(&raw)?))
            })
            .collect()
    }

    pub async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(sqlx::query_scalar("SELECT key FROM entries WHERE map = ? ORDER BY rowid ASC")
            .bind(&self.name)
            .fetch_all(&self.pool)
            .await?)
    }

    pub async fn values(&self) -> Result<Vec<V>, StoreError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .map(|(_, value)| value)
            .collect())
    }

    /// Atomically replaces the value under `key` with `f(current)` and returns the new value.
    ///
    /// Implemented as compare-and-swap on the stored text: the write only lands if the row
    /// still holds what `f` saw, otherwise `f` runs again on the fresh value. Only writers
    /// of the same key ever retry.
    pub async fn compute<F>(&self, key: &str, mut f: F) -> Result<V, StoreError>
    where
        F: FnMut(Option<V>) -> V,
    {
        loop {
            let current = self.raw(key).await?;
            let next = f(current
                .as_deref()
                .map(serde_json::from_str)
                .transpose()?);
            let encoded = serde_json::to_string(&next)?;

            let result = match &current {
                Some(expected) => {
                    sqlx::query(
                        "UPDATE entries SET value = ? WHERE map = ? AND key = ? AND value = ?",
                    )
                    .bind(&encoded)
                    .bind(&self.name)
                    .bind(key)
                    .bind(expected)
                    .execute(&self.pool)
                    .await?
                }
                None => {
                    sqlx::query(
                        r#"
                        INSERT INTO entries (map, key, value) VALUES (?, ?, ?)
                        ON CONFLICT (map, key) DO NOTHING
                        "#,
                    )
                    .bind(&self.name)
                    .bind(key)
                    .bind(&encoded)
                    .execute(&self.pool)
                    .await?
                }
            };

            if result.rows_affected() == 1 {
                return Ok(next);
            }
            tracing::trace!(map = %self.name, key, "Lost compare-and-swap race, retrying");
        }
    }
}
